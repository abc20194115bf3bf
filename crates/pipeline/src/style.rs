//! Style-variation orchestrator: one prompt rendered in a given style,
//! several times.

use illustrator_core::error::CoreError;
use illustrator_core::gateway::ImageSynthesizer;
use illustrator_core::generation::clamp_style_count;
use illustrator_core::naming::style_filename;
use illustrator_core::prompt::{style_prompt, validate_prompt};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::runner::{check_settings, PipelineOptions};
use crate::scene::{render, SceneOutcome};
use crate::store::OutputStore;

/// Output of [`generate_style_variations`].
#[derive(Debug, Clone, Serialize)]
pub struct StyleResult {
    pub batch_id: Uuid,
    pub style: String,
    pub variations: Vec<SceneOutcome>,
}

impl StyleResult {
    pub fn image_paths(&self) -> Vec<String> {
        self.variations
            .iter()
            .filter_map(|v| v.path().map(str::to_string))
            .collect()
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.variations
            .iter()
            .filter_map(|v| v.url().map(str::to_string))
            .collect()
    }
}

/// Render `count` (clamped to `[1, 4]`) variations of `base_prompt` in `style`.
///
/// Failed variations are recorded and the next one proceeds.
pub async fn generate_style_variations(
    synth: &dyn ImageSynthesizer,
    store: &OutputStore,
    options: &PipelineOptions,
    base_prompt: &str,
    style: &str,
    count: u32,
) -> Result<StyleResult, PipelineError> {
    validate_prompt(base_prompt)?;
    let style = style.trim();
    if style.is_empty() {
        return Err(CoreError::Validation("Style must not be empty".to_string()).into());
    }
    check_settings(options)?;

    let count = clamp_style_count(count);
    let timestamp = chrono::Utc::now().timestamp();
    let mut batch = store.begin_batch().await?;
    tracing::info!(batch_id = %batch.id(), style, count, "Style variations started");

    let rendered = async {
        let mut variations = Vec::with_capacity(count as usize);
        for index in 1..=count {
            let prompt = style_prompt(base_prompt.trim(), style, index);
            let filename = style_filename(timestamp, index);
            let status = render(synth, &mut batch, options, &prompt, &filename).await?;
            variations.push(SceneOutcome {
                index,
                text: style.to_string(),
                prompt,
                status,
            });
        }
        Ok::<_, PipelineError>(variations)
    }
    .await;

    let variations = match rendered {
        Ok(variations) => variations,
        Err(e) => {
            tracing::warn!(batch_id = %batch.id(), error = %e, "Style variations aborted, discarding batch");
            batch.discard().await;
            return Err(e);
        }
    };

    Ok(StyleResult {
        batch_id: batch.id(),
        style: style.to_string(),
        variations,
    })
}
