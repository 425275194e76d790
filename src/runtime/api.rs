//! Producer-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::core::{Engine, RequestHandle, ServiceId};

/// One request as supplied by a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Target service.
    pub service: ServiceId,
    /// Resource units required.
    pub demand: u32,
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SubmissionReceipt {
    /// Accepted onto the service's inbound queue.
    Accepted {
        /// Handle of the queued request.
        handle: RequestHandle,
    },
    /// Rejected synchronously by validation.
    Rejected {
        /// Submission as received.
        submission: Submission,
        /// Validation failure.
        reason: String,
    },
}

impl SubmissionReceipt {
    /// Whether the request entered the engine.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Submit every request in order, arriving now. Rejections are reported per
/// entry and do not stop the batch.
pub fn submit_batch(engine: &Engine, batch: &[Submission]) -> Vec<SubmissionReceipt> {
    batch
        .iter()
        .map(|submission| match engine.submit(submission.service, submission.demand) {
            Ok(handle) => SubmissionReceipt::Accepted { handle },
            Err(e) => {
                tracing::warn!(service = submission.service, demand = submission.demand, error = %e, "submission rejected");
                SubmissionReceipt::Rejected {
                    submission: *submission,
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}
