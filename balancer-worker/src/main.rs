mod config;
mod error;
mod memory_store;
mod metrics;
mod tick;

use std::collections::HashSet;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use balancer_core::{BalancerConfig, PartitionBalancer};
use common_health::HealthRegistry;
use envconfig::Envconfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use config::WorkerConfig;
use error::WorkerError;
use memory_store::InProcessStore;

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    tracing_subscriber::fmt::init();

    let worker_config = WorkerConfig::init_from_env()?;
    let balancer_config = BalancerConfig::new(
        worker_config.owner_id.0.clone(),
        worker_config.namespace.0.clone(),
        worker_config.hub.0.clone(),
        worker_config.consumer_group.0.clone(),
        worker_config.expiration_window.0,
    )
    .map_err(WorkerError::Balancer)?;

    let all_partition_ids: HashSet<String> = (0..worker_config.partition_count)
        .map(|i| i.to_string())
        .collect();

    let health = HealthRegistry::new("liveness");
    let tick_liveness = health
        .register("balancer-tick".to_string(), Duration::from_secs(30))
        .await;

    let router = Router::new()
        .route("/_liveness", get(move || ready_health(health.clone())))
        .merge(metrics::setup_metrics_router());

    let bind_address = format!("{}:{}", worker_config.bind_host, worker_config.bind_port);
    let listener = TcpListener::bind(&bind_address).await?;
    info!(bind_address = %bind_address, "http server listening");

    let shutdown = CancellationToken::new();
    let http_shutdown = shutdown.clone();
    tokio::task::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
            .expect("http server failed");
    });

    let store = InProcessStore::new();
    let mut balancer = PartitionBalancer::new(balancer_config, store);

    let tick_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, starting graceful shutdown");
            tick_shutdown.cancel();
        }
    });

    tick::run(
        &mut balancer,
        &all_partition_ids,
        worker_config.tick_interval.0,
        &tick_liveness,
        &shutdown,
    )
    .await;

    info!("relinquishing held partitions before exit");
    balancer.relinquish(&CancellationToken::new()).await?;

    Ok(())
}

async fn ready_health(health: HealthRegistry) -> common_health::HealthStatus {
    health.get_status()
}
