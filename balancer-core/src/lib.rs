//! Decentralized, leader-free fair-share balancing of partitions across a fleet of consumer
//! instances, coordinated entirely through optimistic-concurrency writes to a pluggable store.
//!
//! No concrete [`OwnershipStore`] implementation lives here; this crate is the algorithm only.

mod analyzer;
mod balancer;
mod config;
mod error;
mod planner;
mod record;
mod relinquisher;
mod renewer;
mod store;

pub use analyzer::Distribution;
pub use balancer::PartitionBalancer;
pub use config::BalancerConfig;
pub use error::{BalancerError, StoreError};
pub use planner::{ClaimKind, FairShare};
pub use record::{OwnershipRecord, PartitionId};
pub use store::OwnershipStore;
