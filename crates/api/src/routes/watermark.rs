//! Route definitions for watermark-removal submissions.

use axum::routing::post;
use axum::Router;

use crate::handlers::watermark;
use crate::state::AppState;

/// ```text
/// POST /remove-watermark  -> remove_watermark
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/remove-watermark", post(watermark::remove_watermark))
}
