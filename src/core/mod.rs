//! Core admission, dispatch, and resource accounting.

pub mod error;
pub mod request;
pub mod ledger;
pub mod workload;
pub mod metrics;
pub mod worker;
pub mod service;
mod dispatch_table;
pub mod engine;

pub use error::{AppResult, DispatchError};
pub use request::{Disposition, Request, RequestHandle, RequestId, RequestRecord, ServiceId, Timing};
pub use ledger::ResourceLedger;
pub use workload::{FixedDelay, Workload, DEFAULT_SERVICE_TIME};
pub use metrics::{MetricsSnapshot, ServiceMetrics};
pub use worker::{Phase, WorkerStats};
pub use service::{Placement, ServiceStats};
pub use engine::Engine;
