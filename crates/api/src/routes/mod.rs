pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the illustration route tree.
///
/// ```text
/// POST /generate                    story -> scene images
/// POST /style                       prompt -> style variations
/// POST /bias                        prompt -> demographic grid
/// GET  /bias/attributes             attribute groups and labels
/// GET  /image/{filename}            serve from the root or the newest batch
/// GET  /image/{batch_id}/{filename} serve a file from a batch
/// ```
pub fn illustration_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handlers::story::generate_story))
        .route("/style", post(handlers::style::generate_style))
        .route("/bias", post(handlers::bias::generate_bias))
        .route("/bias/attributes", get(handlers::bias::list_attributes))
        .route("/image/{filename}", get(handlers::image::serve_root_image))
        .route(
            "/image/{batch_id}/{filename}",
            get(handlers::image::serve_batch_image),
        )
}
