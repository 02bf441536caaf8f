use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::analyzer::analyze;
use crate::config::BalancerConfig;
use crate::error::BalancerError;
use crate::planner::{attempt_claim, is_eligible_to_claim, select_target, ClaimKind, FairShare};
use crate::record::{OwnershipRecord, PartitionId};
use crate::relinquisher::relinquish;
use crate::renewer::renew;
use crate::store::OwnershipStore;

/// One balancer instance's view of the world: its configuration, the store it talks to, the
/// partitions it currently believes it owns, and its own private source of randomness.
///
/// `&mut self` on [`run_tick`](Self::run_tick) and [`relinquish`](Self::relinquish) is the
/// enforcement mechanism for the "no concurrent ticks on one instance" rule: the borrow checker
/// rejects a second call while one is in flight, which is a stronger guarantee than a
/// documentation-only contract.
pub struct PartitionBalancer<S: OwnershipStore> {
    config: BalancerConfig,
    store: S,
    instance_holdings: HashMap<PartitionId, OwnershipRecord>,
    rng: StdRng,
}

impl<S: OwnershipStore> PartitionBalancer<S> {
    pub fn new(config: BalancerConfig, store: S) -> Self {
        Self {
            config,
            store,
            instance_holdings: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// The partitions this instance currently believes it owns, as of the last completed tick.
    pub fn owned_partition_ids(&self) -> HashSet<PartitionId> {
        self.instance_holdings.keys().cloned().collect()
    }

    /// Run one full tick: renew existing holdings, observe the current distribution, and attempt
    /// at most one claim. Returns the record just claimed, if any; `Ok(None)` means this tick
    /// made no claim, either because none was needed or because a peer won the race.
    ///
    /// Checked for cancellation before each suspension point (spec §5): a cancelled tick returns
    /// `Err(BalancerError::Cancelled)` without leaving `instance_holdings` in a half-updated
    /// state beyond what the completed sub-step already committed.
    pub async fn run_tick(
        &mut self,
        all_partition_ids: &HashSet<PartitionId>,
        cancel: &CancellationToken,
    ) -> Result<Option<(OwnershipRecord, ClaimKind)>, BalancerError> {
        if cancel.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }

        let now = Utc::now();
        renew(&self.store, &mut self.instance_holdings, now).await?;

        if cancel.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }

        let snapshot = self
            .store
            .list(&self.config.namespace, &self.config.hub, &self.config.consumer_group)
            .await?;

        if cancel.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }

        let distribution = analyze(
            snapshot,
            all_partition_ids,
            &self.config.owner_id,
            now,
            self.config.expiration_window,
        );

        let fair_share = FairShare::compute(all_partition_ids.len(), distribution.active.len());
        let current_holdings = distribution
            .active
            .get(self.config.owner_id.as_str())
            .map_or(0, |records| records.len());
        info!(
            min_share = fair_share.min_share,
            max_share = fair_share.max_share,
            current_holdings,
            unclaimed = distribution.unclaimed.len(),
            "distribution analyzed"
        );

        if !is_eligible_to_claim(&distribution, fair_share, &self.config.owner_id) {
            return Ok(None);
        }

        let instance_holding_ids: HashSet<PartitionId> = self.instance_holdings.keys().cloned().collect();
        let (target, kind) = match select_target(
            &distribution,
            fair_share,
            &self.config.owner_id,
            &instance_holding_ids,
            &mut self.rng,
        ) {
            Some(target) => target,
            None => return Ok(None),
        };

        if cancel.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }

        let claimed = attempt_claim(
            &self.store,
            &distribution.snapshot,
            &target,
            &self.config.owner_id,
            &self.config.namespace,
            &self.config.hub,
            &self.config.consumer_group,
            now,
        )
        .await?;

        if let Some(record) = &claimed {
            info!(partition_id = %record.partition_id, "tick claimed a new partition");
            self.instance_holdings
                .insert(record.partition_id.clone(), record.clone());
        }

        Ok(claimed.map(|record| (record, kind)))
    }

    /// Step down from every partition this instance currently holds. See
    /// [`relinquisher::relinquish`](crate::relinquisher::relinquish) for the idempotency and
    /// best-effort semantics.
    pub async fn relinquish(&mut self, cancel: &CancellationToken) -> Result<(), BalancerError> {
        if cancel.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }
        relinquish(&self.store, &mut self.instance_holdings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeStore {
        records: Mutex<HashMap<PartitionId, OwnershipRecord>>,
    }

    #[async_trait]
    impl OwnershipStore for FakeStore {
        async fn list(
            &self,
            _namespace: &str,
            _hub: &str,
            _consumer_group: &str,
        ) -> Result<Vec<OwnershipRecord>, StoreError> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn claim(
            &self,
            batch: Vec<OwnershipRecord>,
        ) -> Result<Vec<OwnershipRecord>, StoreError> {
            let mut records = self.records.lock().unwrap();
            let mut accepted = Vec::new();
            for proposal in batch {
                let current_token = records
                    .get(&proposal.partition_id)
                    .and_then(|r| r.version_token.clone());
                if current_token == proposal.version_token {
                    let next_token = match &proposal.version_token {
                        Some(v) => format!("{}+", v),
                        None => "v1".to_owned(),
                    };
                    let stored = proposal.with_version(Some(next_token));
                    records.insert(stored.partition_id.clone(), stored.clone());
                    accepted.push(stored);
                }
            }
            Ok(accepted)
        }
    }

    fn config(owner_id: &str) -> BalancerConfig {
        BalancerConfig::new(owner_id, "ns", "hub", "cg", Duration::from_secs(30)).unwrap()
    }

    #[tokio::test]
    async fn single_instance_claims_all_partitions_over_several_ticks() {
        let store = FakeStore::default();
        let mut balancer = PartitionBalancer::new(config("solo"), store);
        let all: HashSet<PartitionId> = ["0", "1", "2"].into_iter().map(String::from).collect();
        let cancel = CancellationToken::new();

        for _ in 0..all.len() {
            balancer.run_tick(&all, &cancel).await.unwrap();
        }

        assert_eq!(balancer.owned_partition_ids(), all);
    }

    #[tokio::test]
    async fn relinquish_empties_holdings_and_is_idempotent() {
        let store = FakeStore::default();
        let mut balancer = PartitionBalancer::new(config("solo"), store);
        let all: HashSet<PartitionId> = ["0"].into_iter().map(String::from).collect();
        let cancel = CancellationToken::new();

        balancer.run_tick(&all, &cancel).await.unwrap();
        assert_eq!(balancer.owned_partition_ids().len(), 1);

        balancer.relinquish(&cancel).await.unwrap();
        assert!(balancer.owned_partition_ids().is_empty());

        balancer.relinquish(&cancel).await.unwrap();
        assert!(balancer.owned_partition_ids().is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_any_store_call() {
        let store = FakeStore::default();
        let mut balancer = PartitionBalancer::new(config("solo"), store);
        let all: HashSet<PartitionId> = ["0"].into_iter().map(String::from).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = balancer.run_tick(&all, &cancel).await;
        assert!(matches!(result, Err(BalancerError::Cancelled)));
    }
}
