use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

use crate::analyzer::Distribution;
use crate::error::BalancerError;
use crate::record::{OwnershipRecord, PartitionId};
use crate::store::OwnershipStore;

/// Fair-share targets derived from the partition count and the number of active owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairShare {
    pub min_share: usize,
    pub max_share: usize,
}

/// Which of the three §4.E selection branches produced a given claim target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    /// Taken from `distribution.unclaimed` — nobody held it.
    Orphan,
    /// Taken from a peer's holdings (over-provisioned or, as a last resort, at-maximum).
    Steal,
}

impl FairShare {
    pub fn compute(total_partition_count: usize, num_active_owners: usize) -> Self {
        debug_assert!(num_active_owners >= 1, "self is always present");
        let min_share = total_partition_count / num_active_owners;
        FairShare {
            min_share,
            max_share: min_share + 1,
        }
    }
}

/// Whether this instance should attempt a claim this tick, per the §4.E eligibility rule.
///
/// Proceeds iff `own < min_share`, or `own == min_share` and no other active owner holds fewer
/// than `min_share` (the leftover-partition case when `P mod N != 0`).
pub fn is_eligible_to_claim(distribution: &Distribution, fair_share: FairShare, self_owner_id: &str) -> bool {
    let own = distribution
        .active
        .get(self_owner_id)
        .map_or(0, |records| records.len());

    if own < fair_share.min_share {
        return true;
    }

    if own == fair_share.min_share {
        let any_peer_below_min = distribution
            .active
            .iter()
            .filter(|(owner, _)| owner.as_str() != self_owner_id)
            .any(|(_, records)| records.len() < fair_share.min_share);
        return !any_peer_below_min;
    }

    false
}

/// Select a claim target for this tick, in order: an orphan partition, then a partition held by
/// an over-provisioned owner, then (only if still strictly short of `min_share`) a partition
/// held by an at-maximum owner. Returns `None` if none of the three apply.
pub fn select_target(
    distribution: &Distribution,
    fair_share: FairShare,
    self_owner_id: &str,
    instance_holdings: &HashSet<PartitionId>,
    rng: &mut impl Rng,
) -> Option<(PartitionId, ClaimKind)> {
    if !distribution.unclaimed.is_empty() {
        let candidates: Vec<&PartitionId> = distribution.unclaimed.iter().collect();
        let index = rng.gen_range(0..candidates.len());
        info!(partition_id = %candidates[index], "steal-decision: orphan claim");
        return Some((candidates[index].clone(), ClaimKind::Orphan));
    }

    let own = distribution
        .active
        .get(self_owner_id)
        .map_or(0, |records| records.len());

    let over: Vec<&PartitionId> = distribution
        .active
        .iter()
        .filter(|(owner, records)| owner.as_str() != self_owner_id && records.len() > fair_share.max_share)
        .flat_map(|(_, records)| records.iter().map(|r| &r.partition_id))
        .filter(|partition_id| !instance_holdings.contains(*partition_id))
        .collect();

    if !over.is_empty() {
        let index = rng.gen_range(0..over.len());
        info!(partition_id = %over[index], "steal-decision: steal from over-provisioned owner");
        return Some((over[index].clone(), ClaimKind::Steal));
    }

    if own < fair_share.min_share {
        let at_max: Vec<&PartitionId> = distribution
            .active
            .iter()
            .filter(|(owner, records)| {
                owner.as_str() != self_owner_id && records.len() == fair_share.max_share
            })
            .flat_map(|(_, records)| records.iter().map(|r| &r.partition_id))
            .filter(|partition_id| !instance_holdings.contains(*partition_id))
            .collect();

        if !at_max.is_empty() {
            let index = rng.gen_range(0..at_max.len());
            info!(partition_id = %at_max[index], "steal-decision: steal from at-maximum owner");
            return Some((at_max[index].clone(), ClaimKind::Steal));
        }
    }

    // own == min_share, no over-provisioned owner, and we are at minimum: do nothing. Stealing
    // from an at-maximum owner here would not change the distribution's shape. This branch is
    // the conservative behavior preserved from the Open Question in spec §9 — do not invent a
    // new steal rule.
    None
}

/// Look up the most recent record for `partition_id` in the raw snapshot (it may be absent,
/// expired, or belong to another owner), construct a new record proposing this instance as
/// owner, and submit it as a single-element claim batch. Returns the accepted record, or `None`
/// if the write was rejected (a peer won the race).
pub async fn attempt_claim<S: OwnershipStore + ?Sized>(
    store: &S,
    snapshot: &[OwnershipRecord],
    partition_id: &PartitionId,
    self_owner_id: &str,
    namespace: &str,
    hub: &str,
    consumer_group: &str,
    now: DateTime<Utc>,
) -> Result<Option<OwnershipRecord>, BalancerError> {
    let proposal = match snapshot.iter().find(|r| &r.partition_id == partition_id) {
        Some(existing) => existing.clone().with_owner(self_owner_id, now),
        None => OwnershipRecord::new_claim(
            namespace,
            hub,
            consumer_group,
            partition_id,
            self_owner_id,
            now,
        ),
    };

    info!(partition_id = %partition_id, "claim start");

    let accepted = match store.claim(vec![proposal]).await {
        Ok(accepted) => accepted,
        Err(err) => {
            tracing::error!(partition_id = %partition_id, error = %err, "claim failed");
            return Err(err.into());
        }
    };

    match accepted.into_iter().next() {
        Some(record) => {
            info!(partition_id = %partition_id, "claim complete");
            Ok(Some(record))
        }
        None => {
            info!(partition_id = %partition_id, "claim rejected");
            Ok(None)
        }
    }
}
