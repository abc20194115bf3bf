//! HTTP handlers, one module per resource.

pub mod bias;
pub mod image;
pub mod story;
pub mod style;

use std::future::Future;
use std::sync::Arc;

use illustrator_core::gateway::ImageSynthesizer;
use illustrator_pipeline::store::OutputStore;
use illustrator_pipeline::{PipelineError, PipelineOptions};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Convert a client-supplied count to `u32`; orchestrators clamp it further.
pub(crate) fn count_from(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

/// Run one generation batch under the generation lock.
///
/// The batch runs on its own task that owns the lock, so it always
/// reaches its cleanup. If this handler future is dropped (request
/// timeout, client gone) the batch's token is cancelled and the task
/// interrupts the backend, releases it and discards the partial batch
/// before the next request can take the lock.
pub(crate) async fn run_generation<F, Fut, T>(state: &AppState, job: F) -> AppResult<T>
where
    F: FnOnce(Arc<dyn ImageSynthesizer>, OutputStore, PipelineOptions) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let guard = state.generation_lock.clone().lock_owned().await;
    let batch = job(
        state.synthesizer.clone(),
        state.store.clone(),
        state.options.with_cancel(cancel),
    );
    let outcome = tokio::spawn(async move {
        let _guard = guard;
        batch.await
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Generation task failed: {e}")))?;

    Ok(outcome?)
}
