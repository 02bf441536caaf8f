use std::time::Duration;

use chrono::{DateTime, Utc};

/// Identifier of a partition within the scoped `(namespace, hub, consumer_group)` tuple.
pub type PartitionId = String;

/// The unit of coordination exchanged with the [`OwnershipStore`](crate::store::OwnershipStore).
///
/// Immutable once constructed: every field update consumes `self` and returns a new record.
/// `version_token` is the only field the balancer never invents — it is always either copied
/// from a prior observation or left absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub namespace: String,
    pub hub: String,
    pub consumer_group: String,
    pub partition_id: PartitionId,
    /// Empty string denotes "unowned / available".
    pub owner_id: String,
    pub last_modified: DateTime<Utc>,
    /// Opaque value supplied by the store; required for conditional writes. Absent for
    /// records that never existed.
    pub version_token: Option<String>,
}

impl OwnershipRecord {
    /// Construct a brand-new record with no prior version, as issued by the first instance to
    /// claim a previously-unseen partition.
    pub fn new_claim(
        namespace: &str,
        hub: &str,
        consumer_group: &str,
        partition_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace: namespace.to_owned(),
            hub: hub.to_owned(),
            consumer_group: consumer_group.to_owned(),
            partition_id: partition_id.to_owned(),
            owner_id: owner_id.to_owned(),
            last_modified: now,
            version_token: None,
        }
    }

    /// Consume this record to produce one proposing a new owner and a fresh timestamp, keeping
    /// the version token so the write is conditioned on this exact observation.
    pub fn with_owner(self, owner_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner_id.to_owned(),
            last_modified: now,
            ..self
        }
    }

    /// Consume this record to produce a renewal: same owner, fresh timestamp.
    pub fn renewed(self, now: DateTime<Utc>) -> Self {
        Self {
            last_modified: now,
            ..self
        }
    }

    /// Consume this record to produce a relinquish write: empty owner, timestamp preserved (the
    /// owner is stepping down, not "touching" the record).
    pub fn relinquished(self) -> Self {
        Self {
            owner_id: String::new(),
            ..self
        }
    }

    /// Replace the version token with one freshly assigned by the store.
    pub fn with_version(self, version_token: Option<String>) -> Self {
        Self {
            version_token,
            ..self
        }
    }

    pub fn is_unowned(&self) -> bool {
        self.owner_id.is_empty()
    }

    /// A record is active iff `now - last_modified < expiration_window` and it has a non-empty
    /// owner. Otherwise it is expired / orphan.
    pub fn is_active(&self, now: DateTime<Utc>, expiration_window: Duration) -> bool {
        if self.is_unowned() {
            return false;
        }
        let age = now.signed_duration_since(self.last_modified);
        match chrono::Duration::from_std(expiration_window) {
            Ok(window) => age < window,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, age_secs: i64) -> OwnershipRecord {
        let now = Utc::now();
        OwnershipRecord {
            namespace: "ns".to_owned(),
            hub: "hub".to_owned(),
            consumer_group: "cg".to_owned(),
            partition_id: "0".to_owned(),
            owner_id: owner.to_owned(),
            last_modified: now - chrono::Duration::seconds(age_secs),
            version_token: Some("v1".to_owned()),
        }
    }

    #[test]
    fn active_requires_recent_and_owned() {
        let window = Duration::from_secs(30);
        assert!(record("a", 5).is_active(Utc::now(), window));
        assert!(!record("a", 31).is_active(Utc::now(), window));
        assert!(!record("", 5).is_active(Utc::now(), window));
    }

    #[test]
    fn relinquish_clears_owner_but_keeps_timestamp() {
        let rec = record("a", 5);
        let modified = rec.last_modified;
        let relinquished = rec.relinquished();
        assert!(relinquished.is_unowned());
        assert_eq!(relinquished.last_modified, modified);
    }
}
