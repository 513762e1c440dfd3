//! Row structs and DTOs for the hosted database tables.

pub mod history;
pub mod profile;
pub mod subscription;
