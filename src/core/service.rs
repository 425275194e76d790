//! Services: a priority-ordered worker set fed by one dispatcher thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::dispatch_table::Inbound;
use super::metrics::Metrics;
use super::request::{Request, ServiceId};
use super::worker::{Phase, Worker, WorkerStats};
use super::workload::Workload;
use super::DispatchError;
use crate::config::ServiceConfig;

/// Where the dispatcher placed a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Placement {
    /// Reserved on the worker's primary queue.
    Admitted {
        /// Worker rank.
        worker: usize,
    },
    /// Parked on the worker's secondary queue.
    Deferred {
        /// Worker rank.
        worker: usize,
    },
    /// No worker could ever serve the request.
    Dropped,
}

/// Point-in-time view of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Service id.
    pub id: ServiceId,
    /// Dispatcher phase.
    pub phase: Phase,
    /// Requests waiting on the inbound queue.
    pub inbound_depth: usize,
    /// Workers in priority order.
    pub workers: Vec<WorkerStats>,
}

/// Route one request over workers already sorted by priority.
///
/// The first worker with enough available units wins. Otherwise the request
/// is deferred to the first worker whose total capacity fits it, or dropped
/// when none does.
pub(crate) fn route(workers: &[Worker], request: Request, metrics: &Metrics) -> Placement {
    let mut request = request;
    let mut eligible: Option<&Worker> = None;

    for worker in workers {
        match worker.try_admit(request) {
            Ok(()) => {
                metrics.record_admitted();
                return Placement::Admitted {
                    worker: worker.rank(),
                };
            }
            Err(back) => request = back,
        }
        if eligible.is_none() && worker.capacity() >= request.demand {
            eligible = Some(worker);
        }
    }

    if let Some(worker) = eligible {
        worker.defer(request);
        metrics.record_blocked();
        return Placement::Deferred {
            worker: worker.rank(),
        };
    }

    warn!(
        service = request.service,
        request = request.id,
        demand = request.demand,
        "request dropped: demand exceeds every worker's capacity"
    );
    metrics.record_dropped(&request);
    Placement::Dropped
}

/// A service and its workers, sorted ascending by priority.
#[derive(Debug, Clone)]
pub(crate) struct Service {
    id: ServiceId,
    workers: Vec<Worker>,
    inbound: Arc<Inbound>,
}

impl Service {
    pub fn new(id: ServiceId, config: &ServiceConfig, inbound: Arc<Inbound>) -> Self {
        let mut layout = config.workers.clone();
        // Stable: equal priorities keep configuration order.
        layout.sort_by_key(|w| w.priority);
        let workers = layout
            .iter()
            .enumerate()
            .map(|(rank, cfg)| Worker::new(id, rank, cfg))
            .collect();
        Self {
            id,
            workers,
            inbound,
        }
    }

    pub fn stats(&self) -> ServiceStats {
        let (inbound_depth, phase) = self.inbound.depth_and_phase();
        ServiceStats {
            id: self.id,
            phase,
            inbound_depth,
            workers: self.workers.iter().map(Worker::stats).collect(),
        }
    }

    /// Start the worker threads, then the dispatcher thread that owns them.
    pub fn spawn(
        &self,
        workload: &Arc<dyn Workload>,
        metrics: &Arc<Metrics>,
    ) -> Result<JoinHandle<()>, DispatchError> {
        let mut worker_handles = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            match worker.spawn(Arc::clone(workload), Arc::clone(metrics)) {
                Ok(handle) => worker_handles.push(handle),
                Err(e) => {
                    stop_workers(&self.workers, worker_handles, self.id);
                    return Err(e);
                }
            }
        }

        let service = self.clone();
        let metrics = Arc::clone(metrics);
        thread::Builder::new()
            .name(format!("dispatch-s{}", self.id))
            .spawn(move || service.run(&metrics, worker_handles))
            .map_err(|e| {
                // Idle workers exit once stopped; their handles are detached.
                for worker in &self.workers {
                    worker.stop();
                }
                DispatchError::Internal(format!("failed to spawn dispatcher thread: {e}"))
            })
    }

    fn run(&self, metrics: &Metrics, worker_handles: Vec<JoinHandle<()>>) {
        info!(service = self.id, workers = self.workers.len(), "dispatcher started");

        while let Some((request, guard)) = self.inbound.next() {
            let id = request.id;
            let placement = route(&self.workers, request, metrics);
            drop(guard);
            debug!(service = self.id, request = id, ?placement, "request routed");
        }

        info!(service = self.id, "inbound drained, stopping workers");
        stop_workers(&self.workers, worker_handles, self.id);
        self.inbound.set_phase(Phase::Stopped);
        info!(service = self.id, "dispatcher stopped");
    }
}

fn stop_workers(workers: &[Worker], handles: Vec<JoinHandle<()>>, service: ServiceId) {
    for worker in workers {
        worker.stop();
    }
    for handle in handles {
        if handle.join().is_err() {
            error!(service, "worker thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use crate::core::dispatch_table::DispatchTable;
    use std::time::Instant;

    fn service(workers: &[WorkerConfig]) -> Service {
        let table = DispatchTable::new(1);
        let inbound = Arc::clone(table.inbound(0).unwrap());
        Service::new(0, &ServiceConfig::new(workers.to_vec()), inbound)
    }

    fn request(id: u64, demand: u32) -> Request {
        Request::new(id, 0, demand, Instant::now())
    }

    #[test]
    fn test_workers_sorted_by_priority_stable() {
        let svc = service(&[
            WorkerConfig::new(3, 30),
            WorkerConfig::new(1, 10),
            WorkerConfig::new(3, 31),
            WorkerConfig::new(2, 20),
        ]);
        let capacities: Vec<u32> = svc.workers.iter().map(Worker::capacity).collect();
        assert_eq!(capacities, vec![10, 20, 30, 31]);
    }

    #[test]
    fn test_negative_priority_scanned_first() {
        let svc = service(&[WorkerConfig::new(0, 10), WorkerConfig::new(-3, 4)]);
        let priorities: Vec<i32> = svc.stats().workers.iter().map(|w| w.priority).collect();
        assert_eq!(priorities, vec![-3, 0]);

        let metrics = Metrics::new(Instant::now());
        assert_eq!(
            route(&svc.workers, request(0, 4), &metrics),
            Placement::Admitted { worker: 0 }
        );
        assert_eq!(svc.stats().workers[0].capacity, 4);
    }

    #[test]
    fn test_route_admits_first_available_by_priority() {
        let svc = service(&[WorkerConfig::new(2, 10), WorkerConfig::new(1, 10)]);
        let metrics = Metrics::new(Instant::now());

        assert_eq!(
            route(&svc.workers, request(0, 7), &metrics),
            Placement::Admitted { worker: 0 }
        );
        // Rank 0 has 3 left; the next request spills to rank 1.
        assert_eq!(
            route(&svc.workers, request(1, 7), &metrics),
            Placement::Admitted { worker: 1 }
        );
        assert_eq!(
            route(&svc.workers, request(2, 3), &metrics),
            Placement::Admitted { worker: 0 }
        );
        assert_eq!(metrics.snapshot().admitted_count, 3);
    }

    #[test]
    fn test_route_defers_to_first_capacity_eligible() {
        let svc = service(&[
            WorkerConfig::new(1, 4),
            WorkerConfig::new(2, 10),
            WorkerConfig::new(3, 12),
        ]);
        let metrics = Metrics::new(Instant::now());

        assert_eq!(
            route(&svc.workers, request(0, 10), &metrics),
            Placement::Admitted { worker: 1 }
        );
        assert_eq!(
            route(&svc.workers, request(1, 12), &metrics),
            Placement::Admitted { worker: 2 }
        );
        assert_eq!(
            route(&svc.workers, request(2, 8), &metrics),
            Placement::Deferred { worker: 1 }
        );

        let stats = svc.stats();
        assert_eq!(stats.workers[1].secondary_depth, 1);
        assert_eq!(stats.workers[2].secondary_depth, 0);
        assert_eq!(metrics.snapshot().blocked_count, 1);
    }

    #[test]
    fn test_route_drops_when_no_worker_fits() {
        let svc = service(&[WorkerConfig::new(1, 4), WorkerConfig::new(2, 6)]);
        let metrics = Metrics::new(Instant::now());

        assert_eq!(route(&svc.workers, request(0, 7), &metrics), Placement::Dropped);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dropped_count, 1);
        assert_eq!(snapshot.blocked_count, 0);
        assert_eq!(snapshot.records[0].demand, 7);
        for worker in svc.stats().workers {
            assert_eq!(worker.available, worker.capacity);
            assert_eq!(worker.primary_depth + worker.secondary_depth, 0);
        }
    }
}
