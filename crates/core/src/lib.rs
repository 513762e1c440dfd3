//! Domain types and in-process state for the SoraClean backend.
//!
//! Pure logic only: no HTTP, no database. The task registry is the one
//! piece of shared mutable state and lives here so both the provider
//! client and the HTTP layer can be handed the same instance.

pub mod error;
pub mod processing;
pub mod registry;
pub mod task;
pub mod types;
pub mod video_url;
