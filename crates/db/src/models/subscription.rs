//! Subscription plan and user subscription models.

use serde::{Deserialize, Serialize};
use soraclean_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `subscription_plans` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionPlan {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Credits granted by one purchase of this plan.
    pub video_credits: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// A row from the `user_subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSubscription {
    pub id: DbId,
    pub user_id: DbId,
    pub plan_id: DbId,
    pub credits_remaining: i32,
    pub credits_total: i32,
    pub payment_id: Option<String>,
    /// Cleared automatically when the last credit is spent.
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Aggregate view of a user's active subscriptions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub subscriptions: Vec<UserSubscription>,
    pub total_credits: i64,
    pub has_active_subscription: bool,
}

impl SubscriptionSummary {
    /// Summarise a list of active subscriptions.
    pub fn from_active(subscriptions: Vec<UserSubscription>) -> Self {
        let total_credits = subscriptions
            .iter()
            .map(|s| i64::from(s.credits_remaining))
            .sum();
        let has_active_subscription = !subscriptions.is_empty();
        Self {
            subscriptions,
            total_credits,
            has_active_subscription,
        }
    }
}

/// Request body for `POST /purchase`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub plan_id: Option<DbId>,
    /// Reference from the payment provider, when one exists.
    pub payment_id: Option<String>,
}
