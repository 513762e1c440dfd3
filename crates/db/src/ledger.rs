//! Credit and history ledger.
//!
//! [`CreditLedger`] is the seam between the HTTP layer and the hosted
//! database: it covers everything a request needs to check and spend credits
//! and to record what happened to a submission. [`PgLedger`] is the
//! production implementation backed by the repositories.

use async_trait::async_trait;
use soraclean_core::types::DbId;

use crate::models::history::{CreateHistoryEntry, ProcessingHistory};
use crate::models::profile::Profile;
use crate::models::subscription::{SubscriptionPlan, SubscriptionSummary, UserSubscription};
use crate::repositories::{HistoryRepo, PlanRepo, ProfileRepo, SubscriptionRepo};
use crate::DbPool;

/// Data operations needed by the request handlers.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Confirm the backing store is reachable.
    async fn health_check(&self) -> Result<(), sqlx::Error>;

    /// The subscription a new submission would be charged to.
    async fn spendable_subscription(
        &self,
        user_id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    /// Spend one credit from `subscription_id`.
    ///
    /// Fails with [`sqlx::Error::RowNotFound`] if the subscription has no
    /// credits left.
    async fn deduct_credit(&self, subscription_id: DbId) -> Result<UserSubscription, sqlx::Error>;

    /// Give back a credit taken by [`deduct_credit`](Self::deduct_credit)
    /// for a submission that never produced a job.
    async fn refund_credit(&self, subscription_id: DbId) -> Result<(), sqlx::Error>;

    async fn create_history(
        &self,
        entry: &CreateHistoryEntry,
    ) -> Result<ProcessingHistory, sqlx::Error>;

    async fn attach_task_id(&self, history_id: DbId, task_id: &str) -> Result<(), sqlx::Error>;

    async fn mark_history_completed(
        &self,
        history_id: DbId,
        processed_video_url: &str,
    ) -> Result<(), sqlx::Error>;

    async fn mark_history_failed(&self, history_id: DbId, message: &str)
        -> Result<(), sqlx::Error>;

    async fn find_profile(&self, user_id: DbId) -> Result<Option<Profile>, sqlx::Error>;

    async fn subscription_summary(&self, user_id: DbId)
        -> Result<SubscriptionSummary, sqlx::Error>;

    async fn list_history(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProcessingHistory>, sqlx::Error>;

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error>;

    /// Grant a subscription for `plan_id`. Returns `None` for an unknown or
    /// retired plan.
    async fn create_subscription(
        &self,
        user_id: DbId,
        plan_id: DbId,
        payment_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;
}

/// Postgres-backed [`CreditLedger`].
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CreditLedger for PgLedger {
    async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }

    async fn spendable_subscription(
        &self,
        user_id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        SubscriptionRepo::find_spendable(&self.pool, user_id).await
    }

    async fn deduct_credit(&self, subscription_id: DbId) -> Result<UserSubscription, sqlx::Error> {
        SubscriptionRepo::deduct_credit(&self.pool, subscription_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn refund_credit(&self, subscription_id: DbId) -> Result<(), sqlx::Error> {
        if SubscriptionRepo::refund_credit(&self.pool, subscription_id)
            .await?
            .is_none()
        {
            tracing::warn!(%subscription_id, "Refund skipped, subscription missing or full");
        }
        Ok(())
    }

    async fn create_history(
        &self,
        entry: &CreateHistoryEntry,
    ) -> Result<ProcessingHistory, sqlx::Error> {
        HistoryRepo::create(&self.pool, entry).await
    }

    async fn attach_task_id(&self, history_id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        if !HistoryRepo::set_task_id(&self.pool, history_id, task_id).await? {
            tracing::warn!(%history_id, task_id, "History entry vanished before task id was attached");
        }
        Ok(())
    }

    async fn mark_history_completed(
        &self,
        history_id: DbId,
        processed_video_url: &str,
    ) -> Result<(), sqlx::Error> {
        if !HistoryRepo::mark_completed(&self.pool, history_id, processed_video_url).await? {
            tracing::warn!(%history_id, "History entry not found when marking completed");
        }
        Ok(())
    }

    async fn mark_history_failed(
        &self,
        history_id: DbId,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        if !HistoryRepo::mark_failed(&self.pool, history_id, message).await? {
            tracing::warn!(%history_id, "History entry not found when marking failed");
        }
        Ok(())
    }

    async fn find_profile(&self, user_id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        ProfileRepo::find_by_id(&self.pool, user_id).await
    }

    async fn subscription_summary(
        &self,
        user_id: DbId,
    ) -> Result<SubscriptionSummary, sqlx::Error> {
        let active = SubscriptionRepo::list_active(&self.pool, user_id).await?;
        Ok(SubscriptionSummary::from_active(active))
    }

    async fn list_history(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProcessingHistory>, sqlx::Error> {
        HistoryRepo::list_for_user(&self.pool, user_id, limit).await
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        PlanRepo::list_active(&self.pool).await
    }

    async fn create_subscription(
        &self,
        user_id: DbId,
        plan_id: DbId,
        payment_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        let Some(plan) = PlanRepo::find_by_id(&self.pool, plan_id).await? else {
            return Ok(None);
        };
        if !plan.is_active {
            return Ok(None);
        }
        let subscription = SubscriptionRepo::create(&self.pool, user_id, &plan, payment_id).await?;
        tracing::info!(
            %user_id,
            plan = %plan.name,
            credits = plan.video_credits,
            "Subscription granted",
        );
        Ok(Some(subscription))
    }
}
