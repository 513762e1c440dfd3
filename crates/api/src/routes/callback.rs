use axum::routing::post;
use axum::Router;

use crate::handlers::callback;
use crate::state::AppState;

/// Provider webhook, mounted at `/callback`.
pub fn router() -> Router<AppState> {
    Router::new().route("/callback", post(callback::receive_callback))
}
