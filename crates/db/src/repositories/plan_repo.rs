//! Repository for the `subscription_plans` table.

use soraclean_core::types::DbId;
use sqlx::PgPool;

use crate::models::subscription::SubscriptionPlan;

/// Column list for `subscription_plans` queries.
const COLUMNS: &str = "id, name, description, price, video_credits, is_active, created_at";

/// Provides read access to the plan catalogue.
pub struct PlanRepo;

impl PlanRepo {
    /// List purchasable plans, cheapest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscription_plans WHERE is_active = TRUE ORDER BY price ASC"
        );
        sqlx::query_as::<_, SubscriptionPlan>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a plan by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_plans WHERE id = $1");
        sqlx::query_as::<_, SubscriptionPlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
