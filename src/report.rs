//! Human-readable rendering of a drained engine's metrics.

use std::fmt;

use crate::core::MetricsSnapshot;
use crate::util::clock::as_millis;

const RULE: &str = "----------------------------------------------------------------------------------------------";

/// Text report of a [`MetricsSnapshot`]: dropped requests, executed requests
/// in start order, then averages and counters. Times are milliseconds
/// relative to the engine epoch.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a>(pub &'a MetricsSnapshot);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;

        writeln!(f, "Requests dropped due to resource constraints")?;
        writeln!(f)?;
        writeln!(f, " {:>9}  |  {:>7}  |  {:>6}", "Request #", "Service", "Demand")?;
        writeln!(f, "{}", &RULE[..38])?;
        for record in snapshot.dropped() {
            writeln!(f, " {:>9}  |  {:>7}  |  {:>6}", record.id, record.service, record.demand)?;
        }

        writeln!(f)?;
        writeln!(f, "Process order of requests")?;
        writeln!(f)?;
        writeln!(
            f,
            " {:>9}  |  {:>7}  |  {:>6}  |  {:>7}  |  {:>7}  |  {:>7}  |  {:>7}  |  {:>10}",
            "Request #", "Service", "Demand", "Arrival", "Start", "End", "Wait", "Turnaround"
        )?;
        writeln!(f, "{RULE}")?;
        for record in snapshot.executed() {
            let Some(timing) = record.timing else {
                continue;
            };
            writeln!(
                f,
                " {:>9}  |  {:>7}  |  {:>6}  |  {:>7}  |  {:>7}  |  {:>7}  |  {:>7}  |  {:>10}",
                record.id,
                record.service,
                record.demand,
                as_millis(record.arrival),
                as_millis(timing.started),
                as_millis(timing.completed),
                as_millis(timing.waiting),
                as_millis(timing.turnaround),
            )?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f)?;

        writeln!(f, "=> Average waiting time = {} ms", as_millis(snapshot.average_waiting()))?;
        writeln!(
            f,
            "=> Average turnaround time = {} ms",
            as_millis(snapshot.average_turnaround())
        )?;
        writeln!(
            f,
            "=> Requests rejected due to lack of resources = {}",
            snapshot.dropped_count
        )?;
        writeln!(
            f,
            "=> Requests blocked due to lack of resources = {}",
            snapshot.blocked_count
        )
    }
}

/// Render `snapshot` as text.
#[must_use]
pub fn render(snapshot: &MetricsSnapshot) -> String {
    Report(snapshot).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Disposition, RequestRecord, Timing};
    use std::time::Duration;

    fn executed(id: u64, started_ms: u64) -> RequestRecord {
        RequestRecord {
            id,
            service: 1,
            demand: 4,
            arrival: Duration::ZERO,
            disposition: Disposition::Admitted { worker: 0 },
            timing: Some(Timing {
                started: Duration::from_millis(started_ms),
                completed: Duration::from_millis(started_ms + 100),
                waiting: Duration::from_millis(started_ms),
                turnaround: Duration::from_millis(started_ms + 100),
            }),
        }
    }

    #[test]
    fn test_render_sections_and_averages() {
        let snapshot = MetricsSnapshot {
            dropped_count: 1,
            blocked_count: 2,
            admitted_count: 2,
            executed_count: 2,
            records: vec![
                RequestRecord {
                    id: 7,
                    service: 0,
                    demand: 99,
                    arrival: Duration::ZERO,
                    disposition: Disposition::Dropped,
                    timing: None,
                },
                executed(1, 0),
                executed(2, 40),
            ],
        };

        let text = render(&snapshot);
        assert!(text.contains("Requests dropped due to resource constraints"));
        assert!(text.contains("Process order of requests"));
        assert!(text.contains("=> Average waiting time = 20 ms"));
        assert!(text.contains("=> Average turnaround time = 120 ms"));
        assert!(text.contains("=> Requests rejected due to lack of resources = 1"));
        assert!(text.contains("=> Requests blocked due to lack of resources = 2"));

        let dropped_row = text.lines().find(|l| l.contains("|") && l.trim_start().starts_with('7'));
        assert!(dropped_row.is_some_and(|row| row.contains("99")));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let text = render(&MetricsSnapshot::default());
        assert!(text.contains("=> Average waiting time = 0 ms"));
    }
}
