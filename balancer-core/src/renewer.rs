use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::BalancerError;
use crate::record::{OwnershipRecord, PartitionId};
use crate::store::OwnershipStore;

/// Refresh timestamps on every entry in `holdings`, submitting them as a single claim batch.
///
/// On success, `holdings` is replaced wholesale with the accepted records, indexed by partition
/// id. Records silently rejected by the store (a peer concurrently claimed the partition) drop
/// out of `holdings` — this is how the instance learns it has lost a partition. On a transport
/// error, `holdings` is left unchanged so the next tick can retry.
pub async fn renew<S: OwnershipStore + ?Sized>(
    store: &S,
    holdings: &mut HashMap<PartitionId, OwnershipRecord>,
    now: DateTime<Utc>,
) -> Result<(), BalancerError> {
    if holdings.is_empty() {
        return Ok(());
    }

    let batch: Vec<OwnershipRecord> = holdings
        .values()
        .cloned()
        .map(|record| record.renewed(now))
        .collect();
    let submitted = batch.len();

    info!(submitted, "renewal start");

    let accepted = match store.claim(batch).await {
        Ok(accepted) => accepted,
        Err(err) => {
            error!(error = %err, "renewal failed");
            return Err(err.into());
        }
    };

    info!(
        submitted,
        accepted = accepted.len(),
        "renewal complete"
    );

    *holdings = accepted
        .into_iter()
        .map(|record| (record.partition_id.clone(), record))
        .collect();

    Ok(())
}
