//! Error types for admission and engine lifecycle operations.

use thiserror::Error;

/// Errors produced by the dispatch engine.
///
/// Only `InvalidService` and `InvalidDemand` are submission validation
/// failures. Dropping or deferring a request is a scheduling outcome recorded
/// in metrics, never an error.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target service id is out of range.
    #[error("invalid service {service}: engine has {services} services")]
    InvalidService {
        /// Requested service id.
        service: usize,
        /// Number of configured services.
        services: usize,
    },
    /// The resource demand is not positive.
    #[error("invalid demand {demand}: demand must be greater than 0")]
    InvalidDemand {
        /// Rejected demand.
        demand: u32,
    },
    /// No further requests are accepted after the stop signal.
    #[error("engine closed: no more requests are accepted")]
    Closed,
    /// Metrics were requested before the engine drained.
    #[error("engine has not drained yet")]
    NotDrained,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A dispatcher thread failed or a workload panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
