//! Async drain helpers for callers running on a tokio runtime.

use std::sync::Arc;

use crate::core::{DispatchError, Engine, MetricsSnapshot};

/// Wait for the engine to drain without blocking the async runtime.
///
/// The blocking join runs on tokio's blocking thread pool.
///
/// # Errors
///
/// Same as [`Engine::await_drain`], or `DispatchError::Internal` if the
/// blocking task itself failed.
pub async fn await_drain_async(engine: Arc<Engine>) -> Result<(), DispatchError> {
    tokio::task::spawn_blocking(move || engine.await_drain())
        .await
        .map_err(|e| DispatchError::Internal(format!("drain task failed: {e}")))?
}

/// Signal, drain, and snapshot without blocking the async runtime.
///
/// # Errors
///
/// Same as [`await_drain_async`].
pub async fn finish_async(engine: Arc<Engine>) -> Result<MetricsSnapshot, DispatchError> {
    engine.signal_no_more_requests();
    await_drain_async(Arc::clone(&engine)).await?;
    engine.snapshot_metrics()
}
