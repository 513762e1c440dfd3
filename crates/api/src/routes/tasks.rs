//! Route definitions for task polling and artifact downloads.

use axum::routing::get;
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// ```text
/// GET /task/{task_id}      -> get_task_status
/// GET /download/{task_id}  -> download_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/task/{task_id}", get(tasks::get_task_status))
        .route("/download/{task_id}", get(tasks::download_video))
}
