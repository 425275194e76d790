//! Per-worker resource accounting.

use serde::{Deserialize, Serialize};

/// Tracks a worker's total and currently available resource units.
///
/// The ledger has no lock of its own: it lives inside the worker state and is
/// only touched while the worker's mutex is held, which makes every
/// reservation and release linearizable per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    total: u32,
    available: u32,
}

impl ResourceLedger {
    /// Create a ledger with all units available.
    #[must_use]
    pub const fn new(total: u32) -> Self {
        Self {
            total,
            available: total,
        }
    }

    /// Units the worker can ever provide.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Units currently unreserved.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Whether a request of `demand` units could ever run here.
    #[must_use]
    pub const fn can_ever_fit(&self, demand: u32) -> bool {
        demand <= self.total
    }

    /// Reserve `demand` units if available. Returns false with no side effect
    /// otherwise.
    pub fn try_reserve(&mut self, demand: u32) -> bool {
        if self.available < demand {
            return false;
        }
        self.available -= demand;
        true
    }

    /// Return `amount` previously reserved units.
    pub fn release(&mut self, amount: u32) {
        debug_assert!(
            self.available + amount <= self.total,
            "release of {amount} units would exceed total {}",
            self.total
        );
        self.available = self.available.saturating_add(amount).min(self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release() {
        let mut ledger = ResourceLedger::new(10);
        assert!(ledger.try_reserve(4));
        assert_eq!(ledger.available(), 6);
        assert!(ledger.try_reserve(6));
        assert_eq!(ledger.available(), 0);

        ledger.release(4);
        assert_eq!(ledger.available(), 4);
        ledger.release(6);
        assert_eq!(ledger.available(), 10);
        assert_eq!(ledger.total(), 10);
    }

    #[test]
    fn test_failed_reserve_has_no_side_effect() {
        let mut ledger = ResourceLedger::new(10);
        assert!(ledger.try_reserve(8));
        assert!(!ledger.try_reserve(3));
        assert_eq!(ledger.available(), 2);
    }

    #[test]
    fn test_can_ever_fit() {
        let ledger = ResourceLedger::new(10);
        assert!(ledger.can_ever_fit(10));
        assert!(!ledger.can_ever_fit(11));
    }
}
