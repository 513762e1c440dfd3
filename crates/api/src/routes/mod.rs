pub mod account;
pub mod callback;
pub mod health;
pub mod tasks;
pub mod watermark;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree. Everything is mounted at the root.
///
/// Route hierarchy:
///
/// ```text
/// /health                        service health (public)
///
/// /remove-watermark              submit a video (POST, requires auth)
/// /task/{task_id}                poll task status (public)
/// /download/{task_id}            stream a finished artifact (public)
/// /callback                      provider completion webhook (POST, public)
///
/// /user/profile                  profile (requires auth)
/// /user/subscription             active subscriptions + credits (requires auth)
/// /user/history                  recent submissions (requires auth)
/// /plans                         purchasable plans (public)
/// /purchase                      buy a plan (POST, requires auth)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(watermark::router())
        .merge(tasks::router())
        .merge(callback::router())
        .merge(account::router())
}
