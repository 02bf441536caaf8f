use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::OwnershipRecord;

/// Abstract contract for listing and conditionally writing ownership records.
///
/// The core depends on these two operations only; the design intentionally supports
/// substituting an in-memory fake store for tests (see `tests/support` — no concrete store
/// implementation belongs in this crate).
#[async_trait]
pub trait OwnershipStore: Send + Sync {
    /// Return every record under the scope, including expired and empty-owner ones. No
    /// filtering, no sorting guarantees.
    async fn list(
        &self,
        namespace: &str,
        hub: &str,
        consumer_group: &str,
    ) -> Result<Vec<OwnershipRecord>, StoreError>;

    /// Each record in `batch` is a proposed write; the store applies the optimistic-concurrency
    /// rule per record independently. Returns exactly those records whose write was accepted,
    /// each carrying a fresh `version_token`. Rejected records are silently omitted — that is
    /// not an error. A transport-level failure fails the whole call.
    async fn claim(
        &self,
        batch: Vec<OwnershipRecord>,
    ) -> Result<Vec<OwnershipRecord>, StoreError>;
}

/// Lets callers share one store across several [`PartitionBalancer`](crate::PartitionBalancer)
/// instances (as the integration tests do) without wrapping it in a newtype.
#[async_trait]
impl<T: OwnershipStore + ?Sized> OwnershipStore for Arc<T> {
    async fn list(
        &self,
        namespace: &str,
        hub: &str,
        consumer_group: &str,
    ) -> Result<Vec<OwnershipRecord>, StoreError> {
        T::list(self, namespace, hub, consumer_group).await
    }

    async fn claim(&self, batch: Vec<OwnershipRecord>) -> Result<Vec<OwnershipRecord>, StoreError> {
        T::claim(self, batch).await
    }
}
