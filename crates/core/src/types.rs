/// Primary keys in the hosted store are UUIDs (users, subscriptions, history rows).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
