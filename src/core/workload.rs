//! Simulated workloads run for admitted requests.

use std::time::Duration;

use super::Request;

/// Default service time for every request.
pub const DEFAULT_SERVICE_TIME: Duration = Duration::from_millis(100);

/// Abstraction for the work performed once a request starts executing.
///
/// Implementations run on a dedicated execution thread, so they may block.
/// The engine releases the request's resources as soon as `run` returns. A
/// panic inside `run` is caught: the units are still released and
/// [`Engine::await_drain`](crate::core::Engine::await_drain) reports
/// `DispatchError::Internal`.
///
/// # Example
///
/// ```rust
/// use prometheus_dispatch::core::{Request, Workload};
///
/// #[derive(Debug)]
/// struct Spin;
///
/// impl Workload for Spin {
///     fn run(&self, request: &Request) {
///         std::hint::black_box(request.demand.pow(2));
///     }
/// }
/// ```
pub trait Workload: Send + Sync + std::fmt::Debug + 'static {
    /// Perform the work for `request`.
    fn run(&self, request: &Request);
}

/// Constant-duration workload, identical for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    service_time: Duration,
}

impl FixedDelay {
    /// Create a workload that sleeps for `service_time`.
    #[must_use]
    pub const fn new(service_time: Duration) -> Self {
        Self { service_time }
    }

    /// Configured service time.
    #[must_use]
    pub const fn service_time(&self) -> Duration {
        self.service_time
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_TIME)
    }
}

impl Workload for FixedDelay {
    fn run(&self, _request: &Request) {
        std::thread::sleep(self.service_time);
    }
}
