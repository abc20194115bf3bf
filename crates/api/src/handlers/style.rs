//! Handler for style variations.

use axum::extract::State;
use axum::Json;
use illustrator_pipeline::scene::SceneOutcome;
use illustrator_pipeline::style::generate_style_variations;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::FormFields;
use crate::handlers::{count_from, run_generation};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StyleResponse {
    pub batch_id: Uuid,
    pub style: String,
    pub images: Vec<String>,
    pub urls: Vec<String>,
    pub variations: Vec<SceneOutcome>,
}

/// POST /style
///
/// Fields: `prompt`, `style` (both required), `count` (default 1).
pub async fn generate_style(
    State(state): State<AppState>,
    fields: FormFields,
) -> AppResult<Json<StyleResponse>> {
    let prompt = fields.required("prompt")?.to_string();
    let style = fields.required("style")?.to_string();
    let count = count_from(fields.parse_or("count", 1i64)?);

    let result = run_generation(&state, |synth, store, options| async move {
        generate_style_variations(synth.as_ref(), &store, &options, &prompt, &style, count).await
    })
    .await?;

    Ok(Json(StyleResponse {
        batch_id: result.batch_id,
        images: result.image_paths(),
        urls: result.image_urls(),
        style: result.style,
        variations: result.variations,
    }))
}
