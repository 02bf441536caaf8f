use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("invalid configuration")]
    Config(#[from] envconfig::Error),
    #[error("balancer error")]
    Balancer(#[from] balancer_core::BalancerError),
    #[error("failed to bind http listener")]
    Bind(#[from] std::io::Error),
}
