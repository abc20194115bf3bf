//! Single synthesis call with timeout and memory hygiene.
//!
//! Every orchestrator goes through [`run_synthesis`]: bound the call by
//! the configured timeout, interrupt the backend if it overruns or the
//! requester goes away, and always release transient accelerator memory
//! before the next call.

use std::time::{Duration, Instant};

use illustrator_core::error::CoreError;
use illustrator_core::gateway::{GeneratedImage, ImageSynthesizer, SynthesisError};
use illustrator_core::generation::{GenerationRequest, GenerationSettings};
use tokio_util::sync::CancellationToken;

/// Default upper bound on one synthesis call.
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings shared by all orchestrators.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub settings: GenerationSettings,
    pub synthesis_timeout: Duration,
    /// Cancelled when the requester stops waiting. The default token is
    /// never cancelled.
    pub cancel: CancellationToken,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            settings: GenerationSettings::default(),
            synthesis_timeout: DEFAULT_SYNTHESIS_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }
}

impl PipelineOptions {
    /// Same settings, bound to `cancel`.
    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }
}

/// Re-check the process-wide settings before a batch.
///
/// They are validated at startup, so a failure here is a server fault,
/// not a client one.
pub(crate) fn check_settings(options: &PipelineOptions) -> Result<(), CoreError> {
    options
        .settings
        .validate()
        .map_err(|e| CoreError::Internal(format!("Invalid generation settings: {e}")))
}

/// Run one synthesis call.
///
/// Returns [`SynthesisError::Cancelled`] without touching the backend if
/// `options.cancel` is already cancelled. Otherwise `release` is called
/// whether the call succeeded, failed, timed out, or was cancelled. A
/// failing release is logged, not returned.
pub async fn run_synthesis(
    synth: &dyn ImageSynthesizer,
    request: &GenerationRequest,
    options: &PipelineOptions,
) -> Result<GeneratedImage, SynthesisError> {
    if options.cancel.is_cancelled() {
        return Err(SynthesisError::Cancelled);
    }
    let started = Instant::now();
    let timeout = options.synthesis_timeout;

    let result = tokio::select! {
        biased;
        () = options.cancel.cancelled() => {
            interrupt(synth, "cancelled").await;
            Err(SynthesisError::Cancelled)
        }
        outcome = tokio::time::timeout(timeout, synth.synthesize(request)) => match outcome {
            Ok(result) => result,
            Err(_) => {
                interrupt(synth, "timed out").await;
                Err(SynthesisError::Timeout(timeout))
            }
        },
    };

    if let Err(e) = synth.release().await {
        tracing::warn!(backend = synth.name(), error = %e, "Failed to release accelerator memory");
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(image) => tracing::debug!(
            backend = synth.name(),
            prompt_len = request.prompt.len(),
            width = image.width,
            height = image.height,
            elapsed_ms,
            "Image synthesized",
        ),
        Err(e) => tracing::warn!(
            backend = synth.name(),
            prompt_len = request.prompt.len(),
            elapsed_ms,
            error = %e,
            "Synthesis failed",
        ),
    }

    result
}

async fn interrupt(synth: &dyn ImageSynthesizer, reason: &str) {
    if let Err(e) = synth.cancel().await {
        tracing::warn!(backend = synth.name(), reason, error = %e, "Failed to interrupt synthesis");
    }
}
