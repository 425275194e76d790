//! Request data model and per-request outcome records.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Unique request identifier, assigned in submission order.
pub type RequestId = u64;

/// Index of a service in the engine's dispatch table.
pub type ServiceId = usize;

/// Handle returned to a producer for an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHandle {
    /// Request identifier.
    pub id: RequestId,
    /// Target service.
    pub service: ServiceId,
}

/// A request travelling through the engine.
///
/// A `Request` is moved between queues and never cloned, so at any instant it
/// is owned by exactly one inbound, primary or secondary queue, or by the
/// execution that is running it.
#[derive(Debug)]
pub struct Request {
    /// Request identifier.
    pub id: RequestId,
    /// Target service.
    pub service: ServiceId,
    /// Resource units required to run.
    pub demand: u32,
    /// Arrival timestamp supplied at submission.
    pub arrival: Instant,
    /// Set once when routed to a secondary queue.
    pub(crate) deferred: bool,
}

impl Request {
    pub(crate) const fn new(id: RequestId, service: ServiceId, demand: u32, arrival: Instant) -> Self {
        Self {
            id,
            service,
            demand,
            arrival,
            deferred: false,
        }
    }

    /// Handle identifying this request.
    #[must_use]
    pub const fn handle(&self) -> RequestHandle {
        RequestHandle {
            id: self.id,
            service: self.service,
        }
    }
}

/// Final disposition of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Disposition {
    /// Reserved immediately and placed on a primary queue.
    Admitted {
        /// Rank of the worker in the service's priority order.
        worker: usize,
    },
    /// Placed on a secondary queue, then promoted and executed.
    Deferred {
        /// Rank of the worker in the service's priority order.
        worker: usize,
    },
    /// No worker in the service could ever satisfy the demand.
    Dropped,
}

/// Execution timestamps, as offsets from the engine epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Execution began.
    pub started: Duration,
    /// Execution finished.
    pub completed: Duration,
    /// `start - arrival`.
    pub waiting: Duration,
    /// `completion - arrival`.
    pub turnaround: Duration,
}

impl Timing {
    /// Derive a timing record from absolute instants.
    #[must_use]
    pub fn from_instants(epoch: Instant, arrival: Instant, started: Instant, completed: Instant) -> Self {
        Self {
            started: started.saturating_duration_since(epoch),
            completed: completed.saturating_duration_since(epoch),
            waiting: started.saturating_duration_since(arrival),
            turnaround: completed.saturating_duration_since(arrival),
        }
    }
}

/// Terminal record of one request, reported through metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Request identifier.
    pub id: RequestId,
    /// Target service.
    pub service: ServiceId,
    /// Resource units required.
    pub demand: u32,
    /// Arrival, as an offset from the engine epoch.
    pub arrival: Duration,
    /// Terminal disposition.
    pub disposition: Disposition,
    /// Execution timestamps; `None` for dropped requests.
    pub timing: Option<Timing>,
}

impl RequestRecord {
    /// Whether the request ran to completion.
    #[must_use]
    pub const fn executed(&self) -> bool {
        self.timing.is_some()
    }
}
