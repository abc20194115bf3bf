//! Bias grid orchestrator: sweep one prompt across a demographic axis.
//!
//! The attribute key is validated before anything touches the backend or
//! the disk. The sweep is all-or-nothing: a grid with holes cannot be
//! compared across groups, so on any failure the batch directory is
//! removed and the error returned.

use illustrator_core::attributes::{clamp_per_value, find_group};
use illustrator_core::gateway::ImageSynthesizer;
use illustrator_core::naming::bias_filename;
use illustrator_core::prompt::{portrait_prompt, validate_prompt};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::runner::{check_settings, run_synthesis, PipelineOptions};
use crate::store::{Batch, OutputStore};

/// Images produced for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasGroup {
    pub label: String,
    pub images: Vec<String>,
    /// Serving routes, parallel to `images`.
    pub urls: Vec<String>,
}

/// Output of [`generate_bias_grid`]: one entry per label, in table order.
#[derive(Debug, Clone, Serialize)]
pub struct BiasGridResult {
    pub batch_id: Uuid,
    pub attribute_type: String,
    pub per_value: u32,
    pub groups: Vec<BiasGroup>,
}

impl BiasGridResult {
    pub fn total_images(&self) -> usize {
        self.groups.iter().map(|g| g.images.len()).sum()
    }
}

/// Generate `per_value` (clamped to `[1, 4]`) portraits for every label
/// of `attribute_type`.
pub async fn generate_bias_grid(
    synth: &dyn ImageSynthesizer,
    store: &OutputStore,
    options: &PipelineOptions,
    base_prompt: &str,
    attribute_type: &str,
    per_value: u32,
) -> Result<BiasGridResult, PipelineError> {
    let group = find_group(attribute_type)?;
    validate_prompt(base_prompt)?;
    check_settings(options)?;

    let per_value = clamp_per_value(per_value);
    let mut batch = store.begin_batch().await?;
    tracing::info!(
        batch_id = %batch.id(),
        attribute_type,
        labels = group.labels.len(),
        per_value,
        "Bias grid started",
    );

    match sweep(synth, &mut batch, options, base_prompt.trim(), group.key, group.labels, per_value).await {
        Ok(groups) => {
            let result = BiasGridResult {
                batch_id: batch.id(),
                attribute_type: group.key.to_string(),
                per_value,
                groups,
            };
            tracing::info!(
                batch_id = %result.batch_id,
                images = result.total_images(),
                "Bias grid finished",
            );
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(batch_id = %batch.id(), error = %e, "Bias grid failed, discarding batch");
            batch.discard().await;
            Err(e)
        }
    }
}

async fn sweep(
    synth: &dyn ImageSynthesizer,
    batch: &mut Batch,
    options: &PipelineOptions,
    base_prompt: &str,
    attribute: &str,
    labels: &[&str],
    per_value: u32,
) -> Result<Vec<BiasGroup>, PipelineError> {
    let mut groups = Vec::with_capacity(labels.len());
    for label in labels {
        let prompt = portrait_prompt(base_prompt, label);
        let request = options.settings.request(&prompt);

        let mut images = Vec::with_capacity(per_value as usize);
        let mut urls = Vec::with_capacity(per_value as usize);
        for replicate in 1..=per_value {
            let image = run_synthesis(synth, &request, options).await?;
            let bytes = image.into_png_bytes()?;
            let stored = batch
                .write(&bias_filename(attribute, label, replicate), &bytes)
                .await?;
            images.push(stored.path);
            urls.push(stored.url);
        }

        groups.push(BiasGroup {
            label: label.to_string(),
            images,
            urls,
        });
    }
    Ok(groups)
}
