//! [`ImageSynthesizer`] implementation on top of a ComfyUI instance.
//!
//! One call = submit the txt2img workflow, poll history until the prompt
//! finishes, download the saved image. The model stays loaded inside
//! ComfyUI for the life of the process; [`release`](ImageSynthesizer::release)
//! only frees intermediate memory.

use std::time::Duration;

use illustrator_core::gateway::{GeneratedImage, ImageSynthesizer, SynthesisError};
use illustrator_core::generation::GenerationRequest;

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::history::{parse_history, HistoryState};
use crate::workflow::{WorkflowTemplate, SAVE_NODE};

/// Default delay between history polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Connection and workflow settings for [`ComfyUIGateway`].
#[derive(Debug, Clone)]
pub struct ComfyUIConfig {
    /// Base HTTP URL, e.g. `http://127.0.0.1:8188`.
    pub api_url: String,
    /// Checkpoint file name as known to ComfyUI.
    pub checkpoint: String,
    /// Negative prompt shared by every call.
    pub negative_prompt: String,
    /// Delay between history polls.
    pub poll_interval: Duration,
}

/// Image synthesizer backed by a single ComfyUI server.
pub struct ComfyUIGateway {
    api: ComfyUIApi,
    template: WorkflowTemplate,
    poll_interval: Duration,
    client_id: String,
}

impl ComfyUIGateway {
    pub fn new(config: ComfyUIConfig) -> Self {
        Self {
            api: ComfyUIApi::new(config.api_url),
            template: WorkflowTemplate {
                checkpoint: config.checkpoint,
                negative_prompt: config.negative_prompt,
            },
            poll_interval: config.poll_interval,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Poll history until the prompt leaves the pending state.
    async fn wait_for_output(&self, prompt_id: &str) -> Result<GeneratedImage, SynthesisError> {
        let mut polls = 0u32;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let history = self.api.get_history(prompt_id).await.map_err(map_api_error)?;
            match parse_history(&history, prompt_id, SAVE_NODE) {
                HistoryState::Pending => continue,
                HistoryState::Failed(message) => {
                    tracing::warn!(prompt_id, polls, error = %message, "ComfyUI prompt failed");
                    return Err(SynthesisError::Execution(message));
                }
                HistoryState::Completed(output) => {
                    tracing::debug!(
                        prompt_id,
                        polls,
                        filename = %output.filename,
                        "ComfyUI prompt completed",
                    );
                    let bytes = self
                        .api
                        .view_image(&output.filename, &output.subfolder, &output.folder_type)
                        .await
                        .map_err(map_api_error)?;
                    return GeneratedImage::from_bytes(bytes);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ImageSynthesizer for ComfyUIGateway {
    async fn synthesize(&self, request: &GenerationRequest) -> Result<GeneratedImage, SynthesisError> {
        let seed: u64 = rand::random();
        let workflow = self.template.build(request, seed);

        let submitted = self
            .api
            .submit_workflow(&workflow, &self.client_id)
            .await
            .map_err(map_api_error)?;
        tracing::debug!(
            prompt_id = %submitted.prompt_id,
            queue_position = submitted.number,
            seed,
            "Workflow queued on ComfyUI",
        );

        self.wait_for_output(&submitted.prompt_id).await
    }

    async fn release(&self) -> Result<(), SynthesisError> {
        self.api.free_memory().await.map_err(map_api_error)
    }

    async fn cancel(&self) -> Result<(), SynthesisError> {
        self.api.interrupt().await.map_err(map_api_error)
    }

    async fn health(&self) -> Result<(), SynthesisError> {
        self.api.system_stats().await.map(|_| ()).map_err(map_api_error)
    }

    fn name(&self) -> &str {
        "comfyui"
    }
}

/// Connection-level failures mean the backend is unavailable; anything
/// ComfyUI answered with is a backend error.
fn map_api_error(err: ComfyUIApiError) -> SynthesisError {
    match err {
        ComfyUIApiError::Request(e) if e.is_connect() || e.is_timeout() => {
            SynthesisError::Unavailable(e.to_string())
        }
        other => SynthesisError::Backend(other.to_string()),
    }
}
