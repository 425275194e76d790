//! Builder assembling an [`Engine`] from configuration and a workload.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EngineConfig, WorkerConfig};
use crate::core::{DispatchError, Engine, FixedDelay, Workload};

/// Incrementally configures and starts an [`Engine`].
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    workload: Option<Arc<dyn Workload>>,
}

impl EngineBuilder {
    /// Start from an existing configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
            workload: None,
        }
    }

    /// Configuration built so far.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Append a service with the given workers.
    #[must_use]
    pub fn service(mut self, workers: Vec<WorkerConfig>) -> Self {
        self.config = self.config.with_service(workers);
        self
    }

    /// Set the fixed service time used by the default workload.
    #[must_use]
    pub fn service_time(mut self, service_time: Duration) -> Self {
        self.config = self.config.with_service_time(service_time);
        self
    }

    /// Replace the default fixed-delay workload.
    #[must_use]
    pub fn workload(mut self, workload: impl Workload) -> Self {
        self.workload = Some(Arc::new(workload));
        self
    }

    /// Validate the configuration and start the engine.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::with_workload`].
    pub fn build(self) -> Result<Engine, DispatchError> {
        let workload: Arc<dyn Workload> = match self.workload {
            Some(workload) => workload,
            None => Arc::new(FixedDelay::new(self.config.service_time())),
        };
        Engine::with_workload(&self.config, workload)
    }
}
