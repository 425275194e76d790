//! Tests for error types

use prometheus_dispatch::core::DispatchError;

#[test]
fn test_invalid_service_error() {
    let err = DispatchError::InvalidService { service: 4, services: 2 };
    assert_eq!(format!("{}", err), "invalid service 4: engine has 2 services");
}

#[test]
fn test_invalid_demand_error() {
    let err = DispatchError::InvalidDemand { demand: 0 };
    assert_eq!(format!("{}", err), "invalid demand 0: demand must be greater than 0");
}

#[test]
fn test_closed_error() {
    let err = DispatchError::Closed;
    assert_eq!(format!("{}", err), "engine closed: no more requests are accepted");
}

#[test]
fn test_not_drained_error() {
    let err = DispatchError::NotDrained;
    assert_eq!(format!("{}", err), "engine has not drained yet");
}

#[test]
fn test_invalid_config_error() {
    let err = DispatchError::InvalidConfig("no services".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: no services");
}

#[test]
fn test_internal_error_converts_to_anyhow() {
    let err = DispatchError::Internal("spawn failed".to_string());
    let any: anyhow::Error = err.into();
    assert_eq!(any.to_string(), "internal error: spawn failed");
}
