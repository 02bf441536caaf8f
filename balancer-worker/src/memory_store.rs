use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use balancer_core::{OwnershipRecord, OwnershipStore, StoreError};

/// A process-local `OwnershipStore`. Transport, authentication, and serialization against a real
/// shared backend are explicitly out of scope for the core (spec §1) and are the driver's
/// concern to supply; this implementation exists so the binary is runnable standalone, and is the
/// natural place a real deployment would swap in a client for its actual backend instead.
#[derive(Default)]
pub struct InProcessStore {
    records: Mutex<HashMap<String, OwnershipRecord>>,
    next_token: Mutex<u64>,
}

impl InProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_token(&self) -> String {
        let mut next = self.next_token.lock().unwrap();
        *next += 1;
        next.to_string()
    }
}

#[async_trait]
impl OwnershipStore for InProcessStore {
    async fn list(
        &self,
        namespace: &str,
        hub: &str,
        consumer_group: &str,
    ) -> Result<Vec<OwnershipRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.namespace == namespace && r.hub == hub && r.consumer_group == consumer_group)
            .cloned()
            .collect())
    }

    async fn claim(&self, batch: Vec<OwnershipRecord>) -> Result<Vec<OwnershipRecord>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let mut accepted = Vec::with_capacity(batch.len());
        for proposal in batch {
            let current_token = records.get(&proposal.partition_id).and_then(|r| r.version_token.clone());
            if current_token != proposal.version_token {
                continue;
            }
            let stamped = proposal.with_version(Some(self.mint_token()));
            records.insert(stamped.partition_id.clone(), stamped.clone());
            accepted.push(stamped);
        }
        Ok(accepted)
    }
}
