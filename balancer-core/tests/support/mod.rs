use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use balancer_core::{BalancerError, OwnershipRecord, OwnershipStore, PartitionBalancer, PartitionId, StoreError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// In-memory [`OwnershipStore`] double, keyed by partition id, enforcing the same
/// optimistic-concurrency rule a real backend would: a write is accepted only if the submitted
/// `version_token` matches the record's current one (or the record doesn't exist yet and the
/// proposal carries no token). Every accepted write is stamped with a freshly minted token.
///
/// `fail_next` lets a test inject one transient failure to exercise the transport-error path.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<PartitionId, OwnershipRecord>>,
    next_token: Mutex<u64>,
    fail_next: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next_call(&self) {
        *self.fail_next.lock().await = true;
    }

    async fn mint_token(&self) -> String {
        let mut next = self.next_token.lock().await;
        *next += 1;
        next.to_string()
    }
}

#[async_trait]
impl OwnershipStore for InMemoryStore {
    async fn list(
        &self,
        namespace: &str,
        hub: &str,
        consumer_group: &str,
    ) -> Result<Vec<OwnershipRecord>, StoreError> {
        {
            let mut fail_next = self.fail_next.lock().await;
            if *fail_next {
                *fail_next = false;
                return Err(StoreError::Transient("injected list failure".to_owned()));
            }
        }
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.namespace == namespace && r.hub == hub && r.consumer_group == consumer_group)
            .cloned()
            .collect())
    }

    async fn claim(&self, batch: Vec<OwnershipRecord>) -> Result<Vec<OwnershipRecord>, StoreError> {
        {
            let mut fail_next = self.fail_next.lock().await;
            if *fail_next {
                *fail_next = false;
                return Err(StoreError::Transient("injected claim failure".to_owned()));
            }
        }

        let mut records = self.records.lock().await;
        let mut accepted = Vec::with_capacity(batch.len());
        for proposal in batch {
            let current_token = records.get(&proposal.partition_id).and_then(|r| r.version_token.clone());
            if current_token != proposal.version_token {
                continue;
            }
            let stamped = proposal.with_version(Some(self.mint_token().await));
            records.insert(stamped.partition_id.clone(), stamped.clone());
            accepted.push(stamped);
        }
        Ok(accepted)
    }
}

/// Poll `condition` until it returns `true` or `timeout` elapses, sleeping `interval` between
/// attempts. Panics with `message` on timeout. Mirrors the shape of fixed-interval readiness
/// polling used throughout the teacher's own integration suites.
pub async fn wait_for_condition<F>(timeout: Duration, interval: Duration, message: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for condition: {message}");
        }
        tokio::time::sleep(interval).await;
    }
}

/// Tick every balancer in `balancers` once, in order, ignoring `BalancerError::Cancelled` (tests
/// never cancel mid-round) and propagating any other error.
pub async fn tick_all<S: OwnershipStore>(
    balancers: &mut [PartitionBalancer<S>],
    all_partition_ids: &std::collections::HashSet<PartitionId>,
    cancel: &CancellationToken,
) -> Result<(), BalancerError> {
    for balancer in balancers.iter_mut() {
        balancer.run_tick(all_partition_ids, cancel).await?;
    }
    Ok(())
}
