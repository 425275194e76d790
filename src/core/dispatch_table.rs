//! Per-service inbound queues: the boundary producers enqueue into.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::request::{Request, ServiceId};
use super::worker::Phase;
use super::DispatchError;

#[derive(Debug)]
pub(crate) struct InboundState {
    pub queue: VecDeque<Request>,
    pub stop: bool,
    pub phase: Phase,
}

/// One service's inbound queue, its stop flag, and the dispatcher wake-up.
///
/// The lock is held by producers while enqueueing, by the coordinator while
/// signalling stop, and by the dispatcher for the whole routing decision of
/// one request.
#[derive(Debug)]
pub(crate) struct Inbound {
    state: Mutex<InboundState>,
    wake: Condvar,
}

impl Inbound {
    fn new() -> Self {
        Self {
            state: Mutex::new(InboundState {
                queue: VecDeque::new(),
                stop: false,
                phase: Phase::Running,
            }),
            wake: Condvar::new(),
        }
    }

    /// Enqueue a request unless the stop flag is already set.
    pub fn push(&self, request: Request) -> Result<(), DispatchError> {
        let mut state = self.state.lock();
        if state.stop {
            return Err(DispatchError::Closed);
        }
        state.queue.push_back(request);
        drop(state);
        self.wake.notify_one();
        Ok(())
    }

    /// Set the stop flag. Returns false if it was already set.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.stop {
            return false;
        }
        state.stop = true;
        state.phase = Phase::Draining;
        drop(state);
        self.wake.notify_one();
        true
    }

    /// Wait for the next request. Returns the request together with the held
    /// lock, or `None` once the stop flag is set and the queue is empty.
    pub fn next(&self) -> Option<(Request, MutexGuard<'_, InboundState>)> {
        let mut state = self.state.lock();
        while state.queue.is_empty() && !state.stop {
            self.wake.wait(&mut state);
        }
        let request = state.queue.pop_front()?;
        Some((request, state))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.state.lock().phase = phase;
    }

    pub fn depth_and_phase(&self) -> (usize, Phase) {
        let state = self.state.lock();
        (state.queue.len(), state.phase)
    }
}

/// Mapping from service id to its inbound queue.
#[derive(Debug)]
pub(crate) struct DispatchTable {
    inbounds: Vec<Arc<Inbound>>,
}

impl DispatchTable {
    pub fn new(services: usize) -> Self {
        Self {
            inbounds: (0..services).map(|_| Arc::new(Inbound::new())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inbounds.len()
    }

    pub fn inbound(&self, service: ServiceId) -> Result<&Arc<Inbound>, DispatchError> {
        self.inbounds
            .get(service)
            .ok_or(DispatchError::InvalidService {
                service,
                services: self.inbounds.len(),
            })
    }

    /// Close every inbound queue. Returns how many were newly closed.
    pub fn close_all(&self) -> usize {
        self.inbounds.iter().filter(|inbound| inbound.close()).count()
    }
}
