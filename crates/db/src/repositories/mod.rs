//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod history_repo;
pub mod plan_repo;
pub mod profile_repo;
pub mod subscription_repo;

pub use history_repo::HistoryRepo;
pub use plan_repo::PlanRepo;
pub use profile_repo::ProfileRepo;
pub use subscription_repo::SubscriptionRepo;
