//! # Prometheus Dispatch
//!
//! A multi-service admission-control and dispatch engine for resource-constrained
//! worker pools.
//!
//! Independent services each own a set of workers with a fixed resource capacity.
//! Every incoming request targets one service and declares a resource demand. The
//! service's dispatcher scans its workers in priority order and either:
//!
//! - **admits** the request on the first worker with enough *available* units,
//!   reserving them and placing it on that worker's primary queue;
//! - **defers** it to the secondary queue of the first worker whose *total*
//!   capacity could ever fit it, to be promoted once units are released;
//! - **drops** it when no worker in the service could ever serve it.
//!
//! ## Key Features
//!
//! - **Two-level scheduling**: one dispatcher thread per service, one scheduling
//!   thread per worker, one execution thread per in-flight request
//! - **Linearizable accounting**: every reservation and release happens under the
//!   owning worker's lock, so `0 <= available <= total` always holds
//! - **No polling**: dispatchers and workers sleep on `parking_lot::Condvar` and
//!   wake on queue pushes, releases, and stop signals
//! - **Graceful drain**: the stop signal is advisory; queued and in-flight work
//!   always finishes before threads stop
//!
//! ## Example
//!
//! ```rust
//! use prometheus_dispatch::builders::EngineBuilder;
//! use prometheus_dispatch::config::WorkerConfig;
//! use std::time::Duration;
//!
//! let engine = EngineBuilder::default()
//!     .service(vec![WorkerConfig::new(1, 10), WorkerConfig::new(2, 4)])
//!     .service_time(Duration::from_millis(5))
//!     .build()?;
//!
//! engine.submit(0, 3)?;
//! engine.submit(0, 8)?;
//!
//! let metrics = engine.finish()?;
//! assert_eq!(metrics.executed_count, 2);
//! # Ok::<(), prometheus_dispatch::core::DispatchError>(())
//! ```
//!
//! For complete scenarios, see `tests/dispatch_engine_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core admission, dispatch, and resource accounting.
pub mod core;
/// Configuration models for services and workers.
pub mod config;
/// Builders to construct engines from configuration.
pub mod builders;
/// Producer-facing API and async runtime adapters.
pub mod runtime;
/// Text rendering of drained metrics.
pub mod report;
/// Shared utilities.
pub mod util;
