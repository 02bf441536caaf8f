use std::collections::HashSet;
use std::time::Duration;

use balancer_core::{ClaimKind, OwnershipStore, PartitionBalancer, PartitionId};
use common_health::HealthHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Drives `balancer` on a fixed interval until `shutdown` fires, reporting liveness and metrics
/// after each tick. Mirrors `hook-worker`'s separation of the tick/dequeue loop from process
/// wiring in `main`.
///
/// Each tick gets its own short-lived cancellation token rather than `shutdown` itself: `shutdown`
/// only governs whether the loop runs another iteration, while a tick's own token exists so a
/// future timeout layer can abort a single stuck store call without also unwinding the loop.
pub async fn run<S: OwnershipStore>(
    balancer: &mut PartitionBalancer<S>,
    all_partition_ids: &HashSet<PartitionId>,
    tick_interval: Duration,
    liveness: &HealthHandle,
    shutdown: &CancellationToken,
) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("tick loop stopping on shutdown signal");
                return;
            }
            _ = interval.tick() => {
                run_one_tick(balancer, all_partition_ids, liveness).await;
            }
        }
    }
}

async fn run_one_tick<S: OwnershipStore>(
    balancer: &mut PartitionBalancer<S>,
    all_partition_ids: &HashSet<PartitionId>,
    liveness: &HealthHandle,
) {
    let op_cancel = CancellationToken::new();
    let started = std::time::Instant::now();

    match balancer.run_tick(all_partition_ids, &op_cancel).await {
        Ok(Some((record, kind))) => {
            metrics::counter!("balancer_claims_total").increment(1);
            if kind == ClaimKind::Steal {
                metrics::counter!("balancer_steals_total").increment(1);
            }
            info!(partition_id = %record.partition_id, claim_kind = ?kind, "claimed partition");
        }
        Ok(None) => {}
        Err(err) => {
            // `run_tick` doesn't distinguish which of renew/list/claim failed, so this counter
            // covers all three rather than promising renewal-specific tracking.
            metrics::counter!("balancer_tick_errors_total").increment(1);
            error!(error = %err, "tick failed");
        }
    }

    metrics::gauge!("balancer_owned_partitions").set(balancer.owned_partition_ids().len() as f64);
    metrics::histogram!("balancer_tick_duration_seconds").record(started.elapsed().as_secs_f64());
    liveness.report_healthy().await;
}
