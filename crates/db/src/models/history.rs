//! Video processing history models and DTOs.
//!
//! One history row is opened per submission and closed as `completed` or
//! `failed` once the outcome is known (possibly much later, from the
//! provider callback).

use serde::Serialize;
use soraclean_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `video_processing_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessingHistory {
    pub id: DbId,
    pub user_id: DbId,
    pub subscription_id: Option<DbId>,
    pub video_url: String,
    pub status: String,
    pub task_id: Option<String>,
    pub processed_video_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub processing_completed_at: Option<Timestamp>,
}

/// DTO for opening a history entry at submission time.
#[derive(Debug, Clone)]
pub struct CreateHistoryEntry {
    pub user_id: DbId,
    pub subscription_id: Option<DbId>,
    pub video_url: String,
}
