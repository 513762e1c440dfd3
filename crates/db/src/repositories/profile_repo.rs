//! Repository for the `profiles` table.

use soraclean_core::types::DbId;
use sqlx::PgPool;

use crate::models::profile::Profile;

/// Column list for `profiles` queries.
const COLUMNS: &str = "id, email, full_name, avatar_url, created_at, updated_at";

/// Provides data access for user profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Find a profile by the identity service's user id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
