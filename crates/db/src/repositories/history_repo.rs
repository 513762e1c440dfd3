//! Repository for the `video_processing_history` table.

use soraclean_core::processing::{
    HISTORY_STATUS_COMPLETED, HISTORY_STATUS_FAILED, HISTORY_STATUS_PROCESSING,
};
use soraclean_core::types::DbId;
use sqlx::PgPool;

use crate::models::history::{CreateHistoryEntry, ProcessingHistory};

/// Column list for `video_processing_history` queries.
const COLUMNS: &str = "\
    id, user_id, subscription_id, video_url, status, task_id, \
    processed_video_url, error_message, created_at, processing_completed_at";

/// Provides data access for processing history entries.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Open a new entry in the `processing` state.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateHistoryEntry,
    ) -> Result<ProcessingHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_processing_history (user_id, subscription_id, video_url, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProcessingHistory>(&query)
            .bind(dto.user_id)
            .bind(dto.subscription_id)
            .bind(&dto.video_url)
            .bind(HISTORY_STATUS_PROCESSING)
            .fetch_one(pool)
            .await
    }

    /// Link an entry to the provider's task id.
    pub async fn set_task_id(pool: &PgPool, id: DbId, task_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE video_processing_history SET task_id = $2 WHERE id = $1")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close an entry as completed with the processed video location.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        processed_video_url: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_processing_history SET \
                 status = $2, processed_video_url = $3, processing_completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(HISTORY_STATUS_COMPLETED)
        .bind(processed_video_url)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close an entry as failed.
    pub async fn mark_failed(pool: &PgPool, id: DbId, message: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_processing_history SET \
                 status = $2, error_message = $3, processing_completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(HISTORY_STATUS_FAILED)
        .bind(message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent entries for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProcessingHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_processing_history \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ProcessingHistory>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
