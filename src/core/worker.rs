//! Workers: resource-bounded execution units with primary and secondary queues.
//!
//! Each worker runs its own scheduling thread. The thread sleeps on a
//! `parking_lot::Condvar` and is woken whenever one of its queues is pushed,
//! reserved units are released, or its stop flag is set. Queue emptiness and
//! the stop flag are always checked under the same lock that every mutation
//! takes, so a request queued right before the stop transition is never missed.
//!
//! Admitted requests run on short-lived execution threads so the scheduling
//! loop keeps draining its queues while jobs run concurrently.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::ledger::ResourceLedger;
use super::metrics::Metrics;
use super::request::{Request, ServiceId};
use super::workload::Workload;
use super::DispatchError;
use crate::config::WorkerConfig;

/// Lifecycle phase shared by workers and service dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accepting and processing work.
    Running,
    /// Stop requested; finishing queued and in-flight work.
    Draining,
    /// Terminal.
    Stopped,
}

/// Point-in-time view of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Rank in the service's priority order.
    pub rank: usize,
    /// Configured priority (lower is scanned first).
    pub priority: i32,
    /// Total resource capacity.
    pub capacity: u32,
    /// Currently unreserved units.
    pub available: u32,
    /// Requests waiting on the primary queue.
    pub primary_depth: usize,
    /// Requests waiting on the secondary queue.
    pub secondary_depth: usize,
    /// Requests currently executing.
    pub in_flight: usize,
    /// Lifecycle phase.
    pub phase: Phase,
}

#[derive(Debug)]
struct WorkerState {
    ledger: ResourceLedger,
    primary: VecDeque<Request>,
    secondary: VecDeque<Request>,
    in_flight: usize,
    stop: bool,
    phase: Phase,
}

impl WorkerState {
    /// Next request to execute, reserving units for a promoted secondary head.
    fn next_runnable(&mut self) -> Option<Request> {
        let request = match self.primary.pop_front() {
            Some(request) => request,
            None => {
                let demand = self.secondary.front()?.demand;
                if !self.ledger.try_reserve(demand) {
                    return None;
                }
                self.secondary.pop_front()?
            }
        };
        self.in_flight += 1;
        Some(request)
    }

    fn queues_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

#[derive(Debug)]
struct WorkerShared {
    service: ServiceId,
    rank: usize,
    priority: i32,
    capacity: u32,
    state: Mutex<WorkerState>,
    wake: Condvar,
}

/// Handle to a worker, shared by its service dispatcher, its scheduling
/// thread and its execution threads.
#[derive(Debug, Clone)]
pub(crate) struct Worker {
    shared: Arc<WorkerShared>,
}

impl Worker {
    pub fn new(service: ServiceId, rank: usize, config: &WorkerConfig) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                service,
                rank,
                priority: config.priority,
                capacity: config.capacity,
                state: Mutex::new(WorkerState {
                    ledger: ResourceLedger::new(config.capacity),
                    primary: VecDeque::new(),
                    secondary: VecDeque::new(),
                    in_flight: 0,
                    stop: false,
                    phase: Phase::Running,
                }),
                wake: Condvar::new(),
            }),
        }
    }

    pub fn rank(&self) -> usize {
        self.shared.rank
    }

    /// Total capacity; fixed at creation so no lock is needed.
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Reserve the request's demand and place it on the primary queue, or
    /// hand the request back if not enough units are available right now.
    pub fn try_admit(&self, request: Request) -> Result<(), Request> {
        let mut state = self.shared.state.lock();
        if !state.ledger.try_reserve(request.demand) {
            return Err(request);
        }
        state.primary.push_back(request);
        drop(state);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Place the request on the secondary queue without reserving.
    pub fn defer(&self, mut request: Request) {
        debug_assert!(request.demand <= self.shared.capacity);
        request.deferred = true;
        self.shared.state.lock().secondary.push_back(request);
        self.shared.wake.notify_one();
    }

    /// Signal that no more requests will be routed to this worker.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if !state.stop {
            state.stop = true;
            if state.phase == Phase::Running {
                state.phase = Phase::Draining;
            }
        }
        drop(state);
        self.shared.wake.notify_one();
    }

    /// Release a finished request's units and wake the scheduling loop.
    fn complete(&self, demand: u32) {
        let mut state = self.shared.state.lock();
        state.ledger.release(demand);
        state.in_flight -= 1;
        drop(state);
        self.shared.wake.notify_one();
    }

    pub fn stats(&self) -> WorkerStats {
        let state = self.shared.state.lock();
        WorkerStats {
            rank: self.shared.rank,
            priority: self.shared.priority,
            capacity: self.shared.capacity,
            available: state.ledger.available(),
            primary_depth: state.primary.len(),
            secondary_depth: state.secondary.len(),
            in_flight: state.in_flight,
            phase: state.phase,
        }
    }

    /// Start the scheduling thread.
    pub fn spawn(
        &self,
        workload: Arc<dyn Workload>,
        metrics: Arc<Metrics>,
    ) -> Result<JoinHandle<()>, DispatchError> {
        let worker = self.clone();
        thread::Builder::new()
            .name(format!("dispatch-s{}-w{}", self.shared.service, self.shared.rank))
            .spawn(move || worker.run(&workload, &metrics))
            .map_err(|e| DispatchError::Internal(format!("failed to spawn worker thread: {e}")))
    }

    /// Block until a request is runnable, or return `None` once the stop flag
    /// is set and both queues are empty.
    fn next(&self) -> Option<Request> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(request) = state.next_runnable() {
                return Some(request);
            }
            if state.stop && state.queues_empty() {
                return None;
            }
            self.shared.wake.wait(&mut state);
        }
    }

    fn run(&self, workload: &Arc<dyn Workload>, metrics: &Arc<Metrics>) {
        let service = self.shared.service;
        let rank = self.shared.rank;
        debug!(service, worker = rank, priority = self.shared.priority, "worker started");

        let mut executions: Vec<JoinHandle<()>> = Vec::new();
        while let Some(request) = self.next() {
            let started = Instant::now();
            debug!(
                service,
                worker = rank,
                request = request.id,
                demand = request.demand,
                deferred = request.deferred,
                "execution started"
            );

            let execution = Execution {
                worker: self.clone(),
                request,
                started,
                workload: Arc::clone(workload),
                metrics: Arc::clone(metrics),
            };
            if let Some(handle) = execution.spawn() {
                executions.push(handle);
            }
            reap_finished(&mut executions, service, rank);
        }

        let pending = executions.len();
        for handle in executions {
            if handle.join().is_err() {
                error!(service, worker = rank, "execution thread panicked");
            }
        }

        self.shared.state.lock().phase = Phase::Stopped;
        info!(service, worker = rank, joined = pending, "worker stopped");
    }
}

/// Join execution threads that have already exited.
fn reap_finished(executions: &mut Vec<JoinHandle<()>>, service: ServiceId, rank: usize) {
    let mut idx = 0;
    while idx < executions.len() {
        if executions[idx].is_finished() {
            if executions.swap_remove(idx).join().is_err() {
                error!(service, worker = rank, "execution thread panicked");
            }
        } else {
            idx += 1;
        }
    }
}

/// One admitted request bound to the worker that reserved its units.
struct Execution {
    worker: Worker,
    request: Request,
    started: Instant,
    workload: Arc<dyn Workload>,
    metrics: Arc<Metrics>,
}

impl Execution {
    /// Run on a dedicated thread. If the thread cannot be created the request
    /// runs inline so it is never abandoned.
    fn spawn(self) -> Option<JoinHandle<()>> {
        let name = format!(
            "dispatch-s{}-w{}-r{}",
            self.request.service,
            self.worker.rank(),
            self.request.id
        );
        let slot = Arc::new(Mutex::new(Some(self)));
        let thread_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new().name(name).spawn(move || {
            if let Some(execution) = thread_slot.lock().take() {
                execution.finish();
            }
        });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to spawn execution thread, running inline");
                if let Some(execution) = slot.lock().take() {
                    execution.finish();
                }
                None
            }
        }
    }

    fn finish(self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.workload.run(&self.request)));
        let completed = Instant::now();
        if outcome.is_err() {
            error!(
                service = self.request.service,
                worker = self.worker.rank(),
                request = self.request.id,
                "workload panicked, releasing its units"
            );
            self.metrics.record_failure();
        }

        self.worker.complete(self.request.demand);
        self.metrics
            .record_completed(&self.request, self.worker.rank(), self.started, completed);

        debug!(
            service = self.request.service,
            worker = self.worker.rank(),
            request = self.request.id,
            "execution completed"
        );
    }
}
