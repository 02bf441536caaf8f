use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::record::{OwnershipRecord, PartitionId};

/// Per-tick snapshot produced by the Distribution Analyzer. Carries no state beyond the tick
/// that built it.
pub struct Distribution {
    /// Owner id -> that owner's currently active (non-expired, non-empty-owner) records.
    /// Always contains this instance's own key, possibly with an empty list.
    pub active: HashMap<String, Vec<OwnershipRecord>>,
    /// Partition ids with no active owner.
    pub unclaimed: HashSet<PartitionId>,
    /// The raw, unfiltered snapshot as returned by `list`, kept so the Planner can recover
    /// version tokens for expired or foreign records when it attempts to claim them.
    pub snapshot: Vec<OwnershipRecord>,
}

/// Build the per-tick distribution from a fresh store snapshot and the full set of partition
/// ids known to exist. `self_owner_id` is always present as a key in `active`, even with zero
/// holdings.
pub fn analyze(
    snapshot: Vec<OwnershipRecord>,
    all_partition_ids: &HashSet<PartitionId>,
    self_owner_id: &str,
    now: DateTime<Utc>,
    expiration_window: Duration,
) -> Distribution {
    let mut unclaimed: HashSet<PartitionId> = all_partition_ids.clone();
    let mut active: HashMap<String, Vec<OwnershipRecord>> = HashMap::new();
    active.entry(self_owner_id.to_owned()).or_default();

    for record in &snapshot {
        if record.is_active(now, expiration_window) {
            active
                .entry(record.owner_id.clone())
                .or_default()
                .push(record.clone());
            unclaimed.remove(&record.partition_id);
        }
    }

    Distribution {
        active,
        unclaimed,
        snapshot,
    }
}
