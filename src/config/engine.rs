//! Engine, service, and worker configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the simulated service time (milliseconds).
pub const SERVICE_TIME_ENV: &str = "PROMETHEUS_DISPATCH_SERVICE_TIME_MS";

const fn default_service_time_ms() -> u64 {
    100
}

/// A worker's scheduling priority and resource capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Scan priority; lower values (including negative ones) are offered requests first.
    pub priority: i32,
    /// Total resource units; fixed for the run.
    pub capacity: u32,
}

impl WorkerConfig {
    /// Create a worker configuration.
    #[must_use]
    pub const fn new(priority: i32, capacity: u32) -> Self {
        Self { priority, capacity }
    }
}

/// Worker layout of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Workers in configuration order; sorted by priority at startup.
    pub workers: Vec<WorkerConfig>,
}

impl ServiceConfig {
    /// Create a service from its workers.
    #[must_use]
    pub const fn new(workers: Vec<WorkerConfig>) -> Self {
        Self { workers }
    }

    /// Largest worker capacity in this service.
    #[must_use]
    pub fn max_capacity(&self) -> u32 {
        self.workers.iter().map(|w| w.capacity).max().unwrap_or(0)
    }

    /// Validate worker values.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers.is_empty() {
            return Err("at least one worker must be defined".into());
        }
        if let Some(idx) = self.workers.iter().position(|w| w.capacity == 0) {
            return Err(format!("worker {idx} capacity must be greater than 0"));
        }
        Ok(())
    }
}

/// Root engine configuration, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Services, indexed by service id.
    pub services: Vec<ServiceConfig>,
    /// Fixed execution time of every request, in milliseconds.
    #[serde(default = "default_service_time_ms")]
    pub service_time_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            service_time_ms: default_service_time_ms(),
        }
    }
}

impl EngineConfig {
    /// Create an empty configuration with the default service time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `services` services sharing the same worker layout.
    #[must_use]
    pub fn uniform(services: usize, workers: &[WorkerConfig]) -> Self {
        Self {
            services: vec![ServiceConfig::new(workers.to_vec()); services],
            ..Self::default()
        }
    }

    /// Append a service.
    #[must_use]
    pub fn with_service(mut self, workers: Vec<WorkerConfig>) -> Self {
        self.services.push(ServiceConfig::new(workers));
        self
    }

    /// Set the simulated service time.
    #[must_use]
    pub fn with_service_time(mut self, service_time: Duration) -> Self {
        self.service_time_ms = u64::try_from(service_time.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Simulated service time.
    #[must_use]
    pub const fn service_time(&self) -> Duration {
        Duration::from_millis(self.service_time_ms)
    }

    /// Largest worker capacity across all services.
    #[must_use]
    pub fn max_capacity(&self) -> u32 {
        self.services
            .iter()
            .map(ServiceConfig::max_capacity)
            .max()
            .unwrap_or(0)
    }

    /// Validate all services and ensure at least one exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.services.is_empty() {
            return Err("at least one service must be defined".into());
        }
        if self.service_time_ms == 0 {
            return Err("service_time_ms must be greater than 0".into());
        }
        for (idx, service) in self.services.iter().enumerate() {
            service
                .validate()
                .map_err(|e| format!("service {idx} invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from the process environment, loading `.env` first.
    pub fn with_env_overrides(self) -> Result<Self, String> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        self.with_service_time_override(std::env::var(SERVICE_TIME_ENV).ok().as_deref())
    }

    /// Apply a raw service-time override, if present.
    pub fn with_service_time_override(mut self, raw: Option<&str>) -> Result<Self, String> {
        if let Some(raw) = raw {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|e| format!("{SERVICE_TIME_ENV} must be an integer: {e}"))?;
            if ms == 0 {
                return Err(format!("{SERVICE_TIME_ENV} must be greater than 0"));
            }
            self.service_time_ms = ms;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        let cfg = EngineConfig::uniform(3, &[WorkerConfig::new(2, 8), WorkerConfig::new(1, 12)]);
        assert_eq!(cfg.services.len(), 3);
        assert_eq!(cfg.max_capacity(), 12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_service_time_override() {
        let cfg = EngineConfig::uniform(1, &[WorkerConfig::new(1, 10)]);
        let cfg = cfg.with_service_time_override(Some(" 25 ")).unwrap();
        assert_eq!(cfg.service_time(), Duration::from_millis(25));

        let unchanged = cfg.clone().with_service_time_override(None).unwrap();
        assert_eq!(unchanged.service_time_ms, 25);

        assert!(cfg.clone().with_service_time_override(Some("0")).is_err());
        assert!(cfg.with_service_time_override(Some("fast")).is_err());
    }
}
