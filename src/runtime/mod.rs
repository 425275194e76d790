//! Runtime adapters and the producer-facing API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_drain;

pub use api::{submit_batch, Submission, SubmissionReceipt};
#[cfg(feature = "tokio-runtime")]
pub use tokio_drain::{await_drain_async, finish_async};
