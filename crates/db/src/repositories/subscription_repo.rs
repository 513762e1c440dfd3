//! Repository for the `user_subscriptions` table.
//!
//! Credits are spent one at a time with a single conditional `UPDATE`, so
//! two concurrent submissions can never take the balance below zero.

use soraclean_core::types::DbId;
use sqlx::PgPool;

use crate::models::subscription::{SubscriptionPlan, UserSubscription};

/// Column list for `user_subscriptions` queries.
const COLUMNS: &str = "\
    id, user_id, plan_id, credits_remaining, credits_total, \
    payment_id, is_active, created_at, updated_at";

/// Provides data access for user subscriptions and their credit balances.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// The newest active subscription that still has credits, if any.
    pub async fn find_spendable(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_subscriptions \
             WHERE user_id = $1 AND is_active = TRUE AND credits_remaining > 0 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, UserSubscription>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// All active subscriptions for a user, newest first.
    pub async fn list_active(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_subscriptions \
             WHERE user_id = $1 AND is_active = TRUE \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, UserSubscription>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Spend one credit. The subscription is deactivated when it reaches zero.
    ///
    /// Returns `None` if the subscription does not exist or is already empty.
    pub async fn deduct_credit(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        let query = format!(
            "UPDATE user_subscriptions SET \
                 credits_remaining = credits_remaining - 1, \
                 is_active = (credits_remaining - 1) > 0, \
                 updated_at = NOW() \
             WHERE id = $1 AND credits_remaining > 0 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSubscription>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Return one credit spent by [`deduct_credit`](Self::deduct_credit)
    /// and reactivate the subscription.
    ///
    /// Never raises the balance above `credits_total`. Returns `None` if the
    /// subscription does not exist or is already full.
    pub async fn refund_credit(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        let query = format!(
            "UPDATE user_subscriptions SET \
                 credits_remaining = credits_remaining + 1, \
                 is_active = TRUE, \
                 updated_at = NOW() \
             WHERE id = $1 AND credits_remaining < credits_total \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSubscription>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Grant a new subscription with the plan's full credit allowance.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        plan: &SubscriptionPlan,
        payment_id: Option<&str>,
    ) -> Result<UserSubscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_subscriptions \
                 (user_id, plan_id, credits_remaining, credits_total, payment_id, is_active) \
             VALUES ($1, $2, $3, $3, $4, TRUE) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSubscription>(&query)
            .bind(user_id)
            .bind(plan.id)
            .bind(plan.video_credits)
            .bind(payment_id)
            .fetch_one(pool)
            .await
    }
}
