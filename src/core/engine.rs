//! Top-level coordinator owning services, the dispatch table, and metrics.
//!
//! # Lifecycle
//!
//! 1. [`Engine::new`] validates the configuration, sorts each service's
//!    workers and starts one dispatcher thread per service and one scheduling
//!    thread per worker.
//! 2. Producers call [`Engine::submit_request`] from any thread.
//! 3. [`Engine::signal_no_more_requests`] closes every inbound queue.
//! 4. [`Engine::await_drain`] blocks until all queued and in-flight work has
//!    finished and every thread has stopped.
//! 5. [`Engine::snapshot_metrics`] returns the aggregated outcome.
//!
//! ```rust
//! use prometheus_dispatch::config::{EngineConfig, WorkerConfig};
//! use prometheus_dispatch::core::Engine;
//! use std::time::Duration;
//!
//! let config = EngineConfig::uniform(1, &[WorkerConfig::new(1, 10)])
//!     .with_service_time(Duration::from_millis(5));
//! let engine = Engine::new(&config)?;
//! engine.submit(0, 5)?;
//! engine.submit(0, 20)?;
//! engine.signal_no_more_requests();
//! engine.await_drain()?;
//!
//! let metrics = engine.snapshot_metrics()?;
//! assert_eq!(metrics.dropped_count, 1);
//! assert_eq!(metrics.executed_count, 1);
//! # Ok::<(), prometheus_dispatch::core::DispatchError>(())
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::dispatch_table::DispatchTable;
use super::metrics::{Metrics, MetricsSnapshot};
use super::request::{Request, RequestHandle, ServiceId};
use super::service::{Service, ServiceStats};
use super::workload::{FixedDelay, Workload};
use super::DispatchError;
use crate::config::EngineConfig;
use crate::util::clock::now_ms;

/// Admission-control and dispatch engine.
#[derive(Debug)]
pub struct Engine {
    run_id: Uuid,
    table: DispatchTable,
    services: Vec<Service>,
    metrics: Arc<Metrics>,
    /// Dispatcher thread handles; emptied by the first drain.
    handles: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
    drained: AtomicBool,
    failed: AtomicBool,
}

impl Engine {
    /// Create an engine running the fixed-delay workload from `config`.
    ///
    /// # Errors
    ///
    /// - `DispatchError::InvalidConfig` if the configuration is invalid
    /// - `DispatchError::Internal` if a thread could not be spawned
    pub fn new(config: &EngineConfig) -> Result<Self, DispatchError> {
        Self::with_workload(config, Arc::new(FixedDelay::new(config.service_time())))
    }

    /// Create an engine running a custom workload.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::new`].
    pub fn with_workload(
        config: &EngineConfig,
        workload: Arc<dyn Workload>,
    ) -> Result<Self, DispatchError> {
        config.validate().map_err(DispatchError::InvalidConfig)?;

        let run_id = Uuid::new_v4();
        let metrics = Arc::new(Metrics::new(Instant::now()));
        let table = DispatchTable::new(config.services.len());

        let mut services = Vec::with_capacity(config.services.len());
        for (id, service_cfg) in config.services.iter().enumerate() {
            let inbound = Arc::clone(table.inbound(id)?);
            services.push(Service::new(id, service_cfg, inbound));
        }

        let mut handles = Vec::with_capacity(services.len());
        for service in &services {
            match service.spawn(&workload, &metrics) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(run_id = %run_id, error = %e, "engine startup failed");
                    table.close_all();
                    for handle in handles {
                        if handle.join().is_err() {
                            error!(run_id = %run_id, "dispatcher thread panicked during startup");
                        }
                    }
                    return Err(e);
                }
            }
        }

        info!(
            run_id = %run_id,
            services = services.len(),
            service_time_ms = config.service_time_ms,
            started_at_ms = %now_ms(),
            "engine started"
        );

        Ok(Self {
            run_id,
            table,
            services,
            metrics,
            handles: Mutex::new(handles),
            next_id: AtomicU64::new(0),
            drained: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        })
    }

    /// Identifier of this run, attached to lifecycle log events.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Instant all reported timestamps are relative to.
    #[must_use]
    pub fn epoch(&self) -> Instant {
        self.metrics.epoch()
    }

    /// Number of configured services.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.table.len()
    }

    /// Enqueue a request on its service's inbound queue.
    ///
    /// # Errors
    ///
    /// - `DispatchError::InvalidService` if `service` is out of range
    /// - `DispatchError::InvalidDemand` if `demand` is zero
    /// - `DispatchError::Closed` after [`Engine::signal_no_more_requests`]
    pub fn submit_request(
        &self,
        service: ServiceId,
        demand: u32,
        arrival: Instant,
    ) -> Result<RequestHandle, DispatchError> {
        let inbound = self.table.inbound(service)?;
        if demand == 0 {
            return Err(DispatchError::InvalidDemand { demand });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(id, service, demand, arrival);
        let handle = request.handle();
        inbound.push(request)?;

        debug!(service, request = id, demand, "request submitted");
        Ok(handle)
    }

    /// Enqueue a request arriving now.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::submit_request`].
    pub fn submit(&self, service: ServiceId, demand: u32) -> Result<RequestHandle, DispatchError> {
        self.submit_request(service, demand, Instant::now())
    }

    /// Tell every service no more requests will be submitted. Idempotent.
    pub fn signal_no_more_requests(&self) {
        let closed = self.table.close_all();
        if closed > 0 {
            info!(run_id = %self.run_id, services = closed, "no more requests");
        }
    }

    /// Block until every service and worker has stopped.
    ///
    /// Only returns once [`Engine::signal_no_more_requests`] has been called
    /// and all queued and in-flight requests have finished.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Internal` if a dispatcher thread panicked, or
    /// if a workload panicked. In the latter case every thread still stopped
    /// normally, so the engine counts as drained and metrics stay available.
    pub fn await_drain(&self) -> Result<(), DispatchError> {
        let mut handles = self.handles.lock();
        let mut panicked = 0usize;
        for handle in handles.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            // Stored before the lock is released so a concurrent caller sees it.
            self.failed.store(true, Ordering::Release);
            error!(run_id = %self.run_id, panicked, "dispatcher thread panicked");
        }
        drop(handles);

        if self.failed.load(Ordering::Acquire) {
            return Err(DispatchError::Internal("dispatcher thread panicked".into()));
        }

        if !self.drained.swap(true, Ordering::AcqRel) {
            info!(run_id = %self.run_id, "engine drained");
        }

        match self.metrics.failures() {
            0 => Ok(()),
            failures => Err(DispatchError::Internal(format!(
                "{failures} workload execution(s) panicked"
            ))),
        }
    }

    /// Whether [`Engine::await_drain`] has joined every thread.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.drained.load(Ordering::Acquire)
    }

    /// Aggregated counters and per-request records.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotDrained` before [`Engine::await_drain`].
    pub fn snapshot_metrics(&self) -> Result<MetricsSnapshot, DispatchError> {
        if !self.is_drained() {
            return Err(DispatchError::NotDrained);
        }
        Ok(self.metrics.snapshot())
    }

    /// Signal, drain, and snapshot in one call.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::await_drain`].
    pub fn finish(&self) -> Result<MetricsSnapshot, DispatchError> {
        self.signal_no_more_requests();
        self.await_drain()?;
        self.snapshot_metrics()
    }

    /// Live view of every service and worker.
    #[must_use]
    pub fn stats(&self) -> Vec<ServiceStats> {
        self.services.iter().map(Service::stats).collect()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Close the queues but don't join: threads drain and exit on their own.
        if !self.is_drained() && self.table.close_all() > 0 {
            debug!(run_id = %self.run_id, "engine dropped without drain - threads detached");
        }
    }
}
