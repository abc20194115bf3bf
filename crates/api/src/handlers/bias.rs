//! Handlers for the demographic bias grid.

use axum::extract::State;
use axum::Json;
use illustrator_core::attributes::{AttributeGroup, ATTRIBUTE_GROUPS};
use illustrator_pipeline::bias::{generate_bias_grid, BiasGridResult};

use crate::error::AppResult;
use crate::extract::FormFields;
use crate::handlers::{count_from, run_generation};
use crate::state::AppState;

/// Default replicates per label when `per_value` is omitted.
const DEFAULT_PER_VALUE: i64 = 2;

/// POST /bias
///
/// Fields: `prompt`, `attribute_type` (both required), `per_value`
/// (default 2, clamped to `[1, 4]`). Unknown attribute types are
/// rejected before any image is generated.
pub async fn generate_bias(
    State(state): State<AppState>,
    fields: FormFields,
) -> AppResult<Json<BiasGridResult>> {
    let prompt = fields.required("prompt")?.to_string();
    let attribute_type = fields.required("attribute_type")?.to_string();
    let per_value = count_from(fields.parse_or("per_value", DEFAULT_PER_VALUE)?);

    let result = run_generation(&state, |synth, store, options| async move {
        generate_bias_grid(
            synth.as_ref(),
            &store,
            &options,
            &prompt,
            &attribute_type,
            per_value,
        )
        .await
    })
    .await?;

    Ok(Json(result))
}

/// GET /bias/attributes
pub async fn list_attributes() -> Json<&'static [AttributeGroup]> {
    Json(ATTRIBUTE_GROUPS)
}
