//! Scene orchestrator: story text -> one image per scene.
//!
//! Scenes are rendered strictly in ascending index order, one synthesis
//! call at a time. A failed call marks that scene as failed and the next
//! scene proceeds; only storage failures abort the request.

use illustrator_core::gateway::{ImageSynthesizer, SynthesisError};
use illustrator_core::generation::clamp_scene_count;
use illustrator_core::naming::scene_filename;
use illustrator_core::prompt::{compose_prompt, resolve_descriptor, validate_prompt, PromptMode};
use illustrator_core::segment::{segment_story, SceneUnit};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::runner::{check_settings, run_synthesis, PipelineOptions};
use crate::store::{Batch, OutputStore};

/// Input of [`illustrate_story`].
#[derive(Debug, Clone)]
pub struct StoryRequest {
    /// Raw story text, or the base subject in simple mode.
    pub text: String,
    /// Character/style descriptor shared by all scenes.
    pub descriptor: Option<String>,
    pub mode: PromptMode,
    /// Requested number of scenes, clamped to `[1, 10]`.
    pub count: u32,
}

/// Result of one image slot in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    Generated {
        path: String,
        url: String,
        width: u32,
        height: u32,
    },
    Failed { error: String },
}

/// One scene (or variation) and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneOutcome {
    pub index: u32,
    pub text: String,
    pub prompt: String,
    #[serde(flatten)]
    pub status: ImageStatus,
}

impl SceneOutcome {
    pub fn path(&self) -> Option<&str> {
        match &self.status {
            ImageStatus::Generated { path, .. } => Some(path),
            ImageStatus::Failed { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.status {
            ImageStatus::Generated { url, .. } => Some(url),
            ImageStatus::Failed { .. } => None,
        }
    }
}

/// Output of [`illustrate_story`].
#[derive(Debug, Clone, Serialize)]
pub struct StoryResult {
    pub batch_id: Uuid,
    /// Source sentences, for display alongside the images.
    pub story: Vec<String>,
    pub scenes: Vec<SceneOutcome>,
}

impl StoryResult {
    /// Paths of successfully generated scenes, in scene order.
    pub fn image_paths(&self) -> Vec<String> {
        self.scenes
            .iter()
            .filter_map(|s| s.path().map(str::to_string))
            .collect()
    }

    /// Serving routes of successfully generated scenes, in scene order.
    pub fn image_urls(&self) -> Vec<String> {
        self.scenes
            .iter()
            .filter_map(|s| s.url().map(str::to_string))
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.path().is_none()).count()
    }
}

/// Plan the scenes for a request.
///
/// Simple mode renders `count` numbered scenes of the whole text;
/// storyline mode renders one scene per sentence, up to `count`.
pub fn plan_scenes(text: &str, mode: PromptMode, count: u32) -> Vec<SceneUnit> {
    match mode {
        PromptMode::Simple => (1..=count)
            .map(|index| SceneUnit {
                index,
                text: text.trim().to_string(),
            })
            .collect(),
        PromptMode::Storyline => segment_story(text, Some(count as usize)),
    }
}

/// Illustrate a story, one image per scene.
pub async fn illustrate_story(
    synth: &dyn ImageSynthesizer,
    store: &OutputStore,
    options: &PipelineOptions,
    request: &StoryRequest,
) -> Result<StoryResult, PipelineError> {
    validate_prompt(&request.text)?;
    check_settings(options)?;

    let count = clamp_scene_count(request.count);
    let descriptor = resolve_descriptor(request.descriptor.as_deref());
    let story: Vec<String> = segment_story(&request.text, Some(count as usize))
        .into_iter()
        .map(|unit| unit.text)
        .collect();
    let units = plan_scenes(&request.text, request.mode, count);

    let mut batch = store.begin_batch().await?;
    tracing::info!(
        batch_id = %batch.id(),
        mode = ?request.mode,
        scenes = units.len(),
        "Story illustration started",
    );

    let rendered = async {
        let mut scenes = Vec::with_capacity(units.len());
        for unit in &units {
            let prompt = compose_prompt(unit, request.text.trim(), descriptor, request.mode);
            let status =
                render(synth, &mut batch, options, &prompt, &scene_filename(unit.index)).await?;
            scenes.push(SceneOutcome {
                index: unit.index,
                text: unit.text.clone(),
                prompt,
                status,
            });
        }
        Ok::<_, PipelineError>(scenes)
    }
    .await;

    let scenes = match rendered {
        Ok(scenes) => scenes,
        Err(e) => {
            tracing::warn!(batch_id = %batch.id(), error = %e, "Story illustration aborted, discarding batch");
            batch.discard().await;
            return Err(e);
        }
    };

    let result = StoryResult {
        batch_id: batch.id(),
        story,
        scenes,
    };
    tracing::info!(
        batch_id = %result.batch_id,
        generated = result.scenes.len() - result.failed_count(),
        failed = result.failed_count(),
        "Story illustration finished",
    );
    Ok(result)
}

/// Synthesize one image and persist it.
///
/// Synthesis failures become [`ImageStatus::Failed`]; storage failures
/// and cancellation propagate.
pub(crate) async fn render(
    synth: &dyn ImageSynthesizer,
    batch: &mut Batch,
    options: &PipelineOptions,
    prompt: &str,
    filename: &str,
) -> Result<ImageStatus, PipelineError> {
    let request = options.settings.request(prompt);
    let image = match run_synthesis(synth, &request, options).await {
        Ok(image) => image,
        Err(SynthesisError::Cancelled) => return Err(PipelineError::Cancelled),
        Err(e) => {
            return Ok(ImageStatus::Failed {
                error: e.to_string(),
            })
        }
    };

    let (width, height) = (image.width, image.height);
    let bytes = match image.into_png_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(ImageStatus::Failed {
                error: e.to_string(),
            })
        }
    };

    let stored = batch.write(filename, &bytes).await?;
    Ok(ImageStatus::Generated {
        path: stored.path,
        url: stored.url,
        width,
        height,
    })
}
