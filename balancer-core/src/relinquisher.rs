use std::collections::HashMap;

use tracing::{error, info};

use crate::error::BalancerError;
use crate::record::{OwnershipRecord, PartitionId};
use crate::store::OwnershipStore;

/// Submit every entry in `holdings` as a single batch with its owner cleared, then drop all of
/// them from `holdings` regardless of which individual writes the store accepted.
///
/// A rejected relinquish means a peer already stole the partition out from under this instance,
/// which leaves the owner field clear anyway — so the outcome this instance cares about
/// (no longer holding the partition) holds either way. Idempotent: calling this with empty
/// holdings, or calling it twice in a row, does nothing on the second call.
pub async fn relinquish<S: OwnershipStore + ?Sized>(
    store: &S,
    holdings: &mut HashMap<PartitionId, OwnershipRecord>,
) -> Result<(), BalancerError> {
    if holdings.is_empty() {
        return Ok(());
    }

    let batch: Vec<OwnershipRecord> = holdings
        .values()
        .cloned()
        .map(|record| record.relinquished())
        .collect();
    let submitted = batch.len();

    info!(submitted, "relinquish start");

    let result = store.claim(batch).await;

    holdings.clear();

    match result {
        Ok(accepted) => {
            info!(submitted, accepted = accepted.len(), "relinquish complete");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "relinquish failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeStore {
        fail: bool,
    }

    #[async_trait]
    impl OwnershipStore for FakeStore {
        async fn list(
            &self,
            _namespace: &str,
            _hub: &str,
            _consumer_group: &str,
        ) -> Result<Vec<OwnershipRecord>, StoreError> {
            Ok(vec![])
        }

        async fn claim(
            &self,
            batch: Vec<OwnershipRecord>,
        ) -> Result<Vec<OwnershipRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Transient("boom".to_owned()));
            }
            Ok(batch)
        }
    }

    fn record(partition: &str) -> OwnershipRecord {
        OwnershipRecord::new_claim("ns", "hub", "cg", partition, "self", Utc::now())
    }

    #[tokio::test]
    async fn empty_holdings_skips_the_call() {
        let store = FakeStore { fail: true };
        let mut holdings = HashMap::new();
        assert!(relinquish(&store, &mut holdings).await.is_ok());
    }

    #[tokio::test]
    async fn holdings_clear_on_success() {
        let store = FakeStore { fail: false };
        let mut holdings = HashMap::new();
        holdings.insert("0".to_owned(), record("0"));
        relinquish(&store, &mut holdings).await.unwrap();
        assert!(holdings.is_empty());
    }

    #[tokio::test]
    async fn holdings_still_clear_when_the_store_call_fails() {
        let store = FakeStore { fail: true };
        let mut holdings = HashMap::new();
        holdings.insert("0".to_owned(), record("0"));
        let result = relinquish(&store, &mut holdings).await;
        assert!(result.is_err());
        assert!(holdings.is_empty());
    }
}
