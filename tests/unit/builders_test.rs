//! Tests for builders

use std::time::Duration;

use prometheus_dispatch::builders::EngineBuilder;
use prometheus_dispatch::config::{EngineConfig, WorkerConfig};
use prometheus_dispatch::core::DispatchError;

#[test]
fn test_engine_builder_accumulates_services() {
    let builder = EngineBuilder::default()
        .service(vec![WorkerConfig::new(1, 4)])
        .service(vec![WorkerConfig::new(1, 8), WorkerConfig::new(2, 2)])
        .service_time(Duration::from_millis(15));

    assert_eq!(builder.config().services.len(), 2);
    assert_eq!(builder.config().service_time_ms, 15);

    let engine = builder.build().unwrap();
    assert_eq!(engine.service_count(), 2);
    let metrics = engine.finish().unwrap();
    assert_eq!(metrics.records.len(), 0);
}

#[test]
fn test_engine_builder_from_config() {
    let cfg = EngineConfig::uniform(3, &[WorkerConfig::new(1, 5)]);
    let builder = EngineBuilder::new(cfg.clone());
    assert_eq!(builder.config(), &cfg);
}

#[test]
fn test_engine_builder_rejects_empty_config() {
    let result = EngineBuilder::default().build();
    assert!(matches!(result, Err(DispatchError::InvalidConfig(_))));
}
