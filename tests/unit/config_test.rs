//! Tests for configuration parsing and validation

use std::time::Duration;

use prometheus_dispatch::config::{EngineConfig, ServiceConfig, WorkerConfig};

#[test]
fn test_engine_config_from_json() {
    let json = r#"
    {
        "services": [
            { "workers": [ { "priority": 2, "capacity": 8 }, { "priority": 1, "capacity": 4 } ] },
            { "workers": [ { "priority": 1, "capacity": 16 } ] }
        ],
        "service_time_ms": 40
    }
    "#;

    let cfg = EngineConfig::from_json_str(json).expect("valid config");
    assert_eq!(cfg.services.len(), 2);
    assert_eq!(cfg.services[0].workers[1], WorkerConfig::new(1, 4));
    assert_eq!(cfg.service_time(), Duration::from_millis(40));
    assert_eq!(cfg.max_capacity(), 16);
    assert_eq!(cfg.services[0].max_capacity(), 8);
}

#[test]
fn test_service_time_defaults_when_omitted() {
    let json = r#"{ "services": [ { "workers": [ { "priority": 1, "capacity": 3 } ] } ] }"#;
    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.service_time_ms, 100);
}

#[test]
fn test_engine_config_rejects_malformed_json() {
    let err = EngineConfig::from_json_str("{ services: ").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_engine_config_requires_service() {
    let err = EngineConfig::new().validate().unwrap_err();
    assert!(err.contains("at least one service"));
}

#[test]
fn test_service_requires_worker() {
    let cfg = EngineConfig::new().with_service(Vec::new());
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("service 0 invalid"));
    assert!(err.contains("at least one worker"));
}

#[test]
fn test_zero_capacity_rejected() {
    let service = ServiceConfig::new(vec![WorkerConfig::new(1, 5), WorkerConfig::new(2, 0)]);
    let err = service.validate().unwrap_err();
    assert!(err.contains("worker 1 capacity"));
}

#[test]
fn test_zero_service_time_rejected() {
    let cfg = EngineConfig::uniform(1, &[WorkerConfig::new(1, 5)])
        .with_service_time(Duration::ZERO);
    assert!(cfg.validate().unwrap_err().contains("service_time_ms"));
}

#[test]
fn test_config_round_trips_through_json() {
    let cfg = EngineConfig::uniform(2, &[WorkerConfig::new(1, 10), WorkerConfig::new(3, 6)]);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_negative_priority_accepted() {
    let json = r#"{ "services": [ { "workers": [ { "priority": -2, "capacity": 3 } ] } ] }"#;
    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.services[0].workers[0], WorkerConfig::new(-2, 3));
}
