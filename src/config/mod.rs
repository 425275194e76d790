//! Configuration models for services, workers, and the simulated workload.

pub mod engine;

pub use engine::{EngineConfig, ServiceConfig, WorkerConfig, SERVICE_TIME_ENV};
