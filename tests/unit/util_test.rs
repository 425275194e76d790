//! Tests for utility helpers and report rendering

use std::time::Duration;

use prometheus_dispatch::core::{Disposition, MetricsSnapshot, RequestRecord, Timing};
use prometheus_dispatch::report::{render, Report};
use prometheus_dispatch::util::clock::{as_millis, now_ms};

#[test]
fn test_now_ms_returns_timestamp() {
    assert!(now_ms() > 0);
}

#[test]
fn test_as_millis_saturates() {
    assert_eq!(as_millis(Duration::from_secs(3)), 3_000);
    assert_eq!(as_millis(Duration::MAX), u64::MAX);
}

#[test]
fn test_report_lists_executed_rows_in_snapshot_order() {
    let timing = |start: u64| Timing {
        started: Duration::from_millis(start),
        completed: Duration::from_millis(start + 10),
        waiting: Duration::from_millis(start),
        turnaround: Duration::from_millis(start + 10),
    };
    let snapshot = MetricsSnapshot {
        dropped_count: 0,
        blocked_count: 1,
        admitted_count: 1,
        executed_count: 2,
        records: vec![
            RequestRecord {
                id: 11,
                service: 0,
                demand: 3,
                arrival: Duration::ZERO,
                disposition: Disposition::Admitted { worker: 0 },
                timing: Some(timing(0)),
            },
            RequestRecord {
                id: 12,
                service: 0,
                demand: 9,
                arrival: Duration::ZERO,
                disposition: Disposition::Deferred { worker: 0 },
                timing: Some(timing(10)),
            },
        ],
    };

    let text = Report(&snapshot).to_string();
    assert_eq!(text, render(&snapshot));

    let first = text.find(" 11 ").unwrap();
    let second = text.find(" 12 ").unwrap();
    assert!(first < second);
    assert!(text.contains("=> Average waiting time = 5 ms"));
    assert!(text.contains("=> Requests blocked due to lack of resources = 1"));
}
