//! Handler for story illustration.

use axum::extract::State;
use axum::Json;
use illustrator_core::prompt::PromptMode;
use illustrator_pipeline::scene::{illustrate_story, SceneOutcome, StoryRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::FormFields;
use crate::handlers::{count_from, run_generation};
use crate::state::AppState;

/// Response of `POST /generate`.
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub batch_id: Uuid,
    /// Source sentences of the story.
    pub story: Vec<String>,
    /// Paths of the generated scenes only, in scene order.
    pub images: Vec<String>,
    /// Serving routes parallel to `images`.
    pub urls: Vec<String>,
    pub scenes: Vec<SceneOutcome>,
}

/// POST /generate
///
/// Fields: `prompt` (required), `count` (default 1), `character`,
/// `mode` (`simple` | `storyline`).
pub async fn generate_story(
    State(state): State<AppState>,
    fields: FormFields,
) -> AppResult<Json<StoryResponse>> {
    let request = StoryRequest {
        text: fields.required("prompt")?.to_string(),
        descriptor: fields.optional("character").map(str::to_string),
        mode: match fields.optional("mode") {
            Some(name) => PromptMode::from_name(name)?,
            None => PromptMode::default(),
        },
        count: count_from(fields.parse_or("count", 1i64)?),
    };

    let result = run_generation(&state, |synth, store, options| async move {
        illustrate_story(synth.as_ref(), &store, &options, &request).await
    })
    .await?;

    Ok(Json(StoryResponse {
        batch_id: result.batch_id,
        images: result.image_paths(),
        urls: result.image_urls(),
        story: result.story,
        scenes: result.scenes,
    }))
}
