use thiserror::Error;

/// Errors that can originate from an [`OwnershipStore`](crate::store::OwnershipStore)
/// implementation. Wrapped by the balancer to provide additional context, matching the
/// teacher's `pgqueue::DatabaseError` / `assignment-coordination::error::Error` shape: one
/// variant per underlying failure mode, each carrying the lower-level cause.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store operation failed transiently: {0}")]
    Transient(String),
    #[error("store operation failed: {0}")]
    Permanent(String),
}

/// Errors surfaced by the balancer's public operations.
#[derive(Error, Debug)]
pub enum BalancerError {
    #[error("ownership store error")]
    Store(#[from] StoreError),
    #[error("tick was cancelled")]
    Cancelled,
    #[error("invalid balancer configuration: {0}")]
    Precondition(String),
}
