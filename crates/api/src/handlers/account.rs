//! Handlers for profiles, subscriptions, processing history and plans.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use soraclean_core::error::CoreError;
use soraclean_db::models::subscription::PurchaseRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of history entries returned by `GET /user/history`.
const HISTORY_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// User endpoints
// ---------------------------------------------------------------------------

/// GET /user/profile
pub async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = state
        .ledger
        .find_profile(user.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Profile",
            id: user.user_id.to_string(),
        })?;

    Ok(DataResponse::new(profile))
}

/// GET /user/subscription
///
/// Active subscriptions and the total credits across them.
pub async fn get_subscription(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = state.ledger.subscription_summary(user.user_id).await?;

    Ok(DataResponse::new(summary))
}

/// GET /user/history
pub async fn list_history(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let history = state.ledger.list_history(user.user_id, HISTORY_LIMIT).await?;

    Ok(DataResponse::new(history))
}

// ---------------------------------------------------------------------------
// Plans and purchases
// ---------------------------------------------------------------------------

/// GET /plans
///
/// Public. Lists purchasable plans, cheapest first.
pub async fn list_plans(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let plans = state.ledger.list_plans().await?;

    Ok(DataResponse::new(plans))
}

/// POST /purchase
///
/// Grants a subscription for the chosen plan. Payment verification happens
/// upstream; `paymentId` is stored as a reference only.
pub async fn purchase(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PurchaseRequest>,
) -> AppResult<impl IntoResponse> {
    let plan_id = input
        .plan_id
        .ok_or_else(|| AppError::BadRequest("Plan ID is required".into()))?;

    let subscription = state
        .ledger
        .create_subscription(user.user_id, plan_id, input.payment_id.as_deref())
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Plan",
            id: plan_id.to_string(),
        })?;

    tracing::info!(
        user_id = %user.user_id,
        plan_id = %plan_id,
        credits = subscription.credits_remaining,
        "Plan purchased",
    );

    Ok((StatusCode::CREATED, DataResponse::new(subscription)))
}
