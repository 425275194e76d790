//! Engine-wide counters and per-request outcome records.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::request::{Disposition, Request, RequestRecord, ServiceId, Timing};

/// Internal counters shared by dispatchers and workers (thread-safe).
///
/// Each counter is independent and incremented at most once per request.
/// Terminal records travel over a channel and are collected at snapshot time.
#[derive(Debug)]
pub(crate) struct Metrics {
    epoch: Instant,
    dropped: AtomicU64,
    blocked: AtomicU64,
    admitted: AtomicU64,
    executed: AtomicU64,
    failures: AtomicU64,
    records_tx: Sender<RequestRecord>,
    records_rx: Receiver<RequestRecord>,
    collected: Mutex<Vec<RequestRecord>>,
}

impl Metrics {
    pub fn new(epoch: Instant) -> Self {
        let (records_tx, records_rx) = unbounded();
        Self {
            epoch,
            dropped: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            records_tx,
            records_rx,
            collected: Mutex::new(Vec::new()),
        }
    }

    pub const fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a drop and keep the request for reporting.
    pub fn record_dropped(&self, request: &Request) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.push(RequestRecord {
            id: request.id,
            service: request.service,
            demand: request.demand,
            arrival: self.offset(request.arrival),
            disposition: Disposition::Dropped,
            timing: None,
        });
    }

    pub fn record_completed(&self, request: &Request, worker: usize, started: Instant, completed: Instant) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        let disposition = if request.deferred {
            Disposition::Deferred { worker }
        } else {
            Disposition::Admitted { worker }
        };
        self.push(RequestRecord {
            id: request.id,
            service: request.service,
            demand: request.demand,
            arrival: self.offset(request.arrival),
            disposition,
            timing: Some(Timing::from_instants(self.epoch, request.arrival, started, completed)),
        });
    }

    /// Count a workload that panicked. Its request is still recorded as
    /// completed once its units are released.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Workload panics observed so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn offset(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.epoch)
    }

    fn push(&self, record: RequestRecord) {
        // The receiver lives as long as `self`, so the send cannot fail.
        if self.records_tx.send(record).is_err() {
            tracing::error!("metrics record channel closed");
        }
    }

    /// Collect pending records and build a snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut collected = self.collected.lock();
        collected.extend(self.records_rx.try_iter());
        let mut records = collected.clone();
        drop(collected);

        // Dropped requests first by id, then executed requests in start order.
        records.sort_by_key(|r| (r.executed(), r.timing.map(|t| t.started), r.id));

        MetricsSnapshot {
            dropped_count: self.dropped.load(Ordering::Relaxed),
            blocked_count: self.blocked.load(Ordering::Relaxed),
            admitted_count: self.admitted.load(Ordering::Relaxed),
            executed_count: self.executed.load(Ordering::Relaxed),
            records,
        }
    }
}

/// Aggregated engine outcome, available once the engine has drained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests no worker could ever serve.
    pub dropped_count: u64,
    /// Requests placed on a secondary queue.
    pub blocked_count: u64,
    /// Requests reserved immediately on a primary queue.
    pub admitted_count: u64,
    /// Requests that ran to completion.
    pub executed_count: u64,
    /// Terminal records: dropped first by id, then executed in start order.
    pub records: Vec<RequestRecord>,
}

/// Outcome counts for a single service, derived from the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    /// Dropped requests.
    pub dropped: u64,
    /// Requests that went through a secondary queue.
    pub blocked: u64,
    /// Requests that ran to completion.
    pub executed: u64,
}

impl MetricsSnapshot {
    /// Records of executed requests, in start order.
    pub fn executed(&self) -> impl Iterator<Item = &RequestRecord> {
        self.records.iter().filter(|r| r.executed())
    }

    /// Records of dropped requests, in id order.
    pub fn dropped(&self) -> impl Iterator<Item = &RequestRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.disposition, Disposition::Dropped))
    }

    /// Look up a record by request id.
    #[must_use]
    pub fn record(&self, id: u64) -> Option<&RequestRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Mean waiting time over executed requests, zero if none ran.
    #[must_use]
    pub fn average_waiting(&self) -> Duration {
        self.average(|t| t.waiting)
    }

    /// Mean turnaround time over executed requests, zero if none ran.
    #[must_use]
    pub fn average_turnaround(&self) -> Duration {
        self.average(|t| t.turnaround)
    }

    fn average(&self, pick: impl Fn(&Timing) -> Duration) -> Duration {
        let (sum, count) = self
            .records
            .iter()
            .filter_map(|r| r.timing.as_ref())
            .fold((Duration::ZERO, 0u32), |(sum, count), t| (sum + pick(t), count + 1));
        if count == 0 {
            Duration::ZERO
        } else {
            sum / count
        }
    }

    /// Per-service breakdown of outcomes.
    #[must_use]
    pub fn for_service(&self, service: ServiceId) -> ServiceMetrics {
        self.records
            .iter()
            .filter(|r| r.service == service)
            .fold(ServiceMetrics::default(), |mut acc, r| {
                match r.disposition {
                    Disposition::Dropped => acc.dropped += 1,
                    Disposition::Deferred { .. } => acc.blocked += 1,
                    Disposition::Admitted { .. } => {}
                }
                if r.executed() {
                    acc.executed += 1;
                }
                acc
            })
    }
}
