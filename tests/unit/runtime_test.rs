//! Tests for the producer-facing batch API

use std::time::Duration;

use prometheus_dispatch::builders::EngineBuilder;
use prometheus_dispatch::config::WorkerConfig;
use prometheus_dispatch::runtime::{submit_batch, Submission, SubmissionReceipt};

#[test]
fn test_submit_batch_reports_rejections_per_entry() {
    let engine = EngineBuilder::default()
        .service(vec![WorkerConfig::new(1, 10)])
        .service_time(Duration::from_millis(5))
        .build()
        .unwrap();

    let batch = [
        Submission { service: 0, demand: 4 },
        Submission { service: 2, demand: 4 },
        Submission { service: 0, demand: 0 },
        Submission { service: 0, demand: 6 },
    ];
    let receipts = submit_batch(&engine, &batch);

    assert_eq!(receipts.len(), 4);
    let accepted: Vec<bool> = receipts.iter().map(SubmissionReceipt::is_accepted).collect();
    assert_eq!(accepted, vec![true, false, false, true]);

    match &receipts[1] {
        SubmissionReceipt::Rejected { submission, reason } => {
            assert_eq!(submission.service, 2);
            assert!(reason.contains("invalid service 2"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    let metrics = engine.finish().unwrap();
    assert_eq!(metrics.executed_count, 2);
}

#[test]
fn test_receipt_serializes_with_status_tag() {
    let receipt = SubmissionReceipt::Rejected {
        submission: Submission { service: 1, demand: 0 },
        reason: "invalid demand 0: demand must be greater than 0".to_string(),
    };
    let value = serde_json::to_value(&receipt).unwrap();
    assert_eq!(value["status"], "rejected");
    assert_eq!(value["submission"]["service"], 1);

    let back: SubmissionReceipt = serde_json::from_value(value).unwrap();
    assert_eq!(back, receipt);
}
