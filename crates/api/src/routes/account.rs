//! Route definitions for account and billing endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// ```text
/// GET  /user/profile       -> get_profile
/// GET  /user/subscription  -> get_subscription
/// GET  /user/history       -> list_history
/// GET  /plans              -> list_plans
/// POST /purchase           -> purchase
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(account::get_profile))
        .route("/user/subscription", get(account::get_subscription))
        .route("/user/history", get(account::list_history))
        .route("/plans", get(account::list_plans))
        .route("/purchase", post(account::purchase))
}
