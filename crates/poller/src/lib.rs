//! `soraclean-poller` library crate.
//!
//! The client side of the task protocol: submit a video, follow the task
//! until it finishes or the polling budget runs out, and fetch the result.
//! The binary entrypoint lives in `main.rs`.

pub mod client;
pub mod poller;
pub mod progress;
pub mod state;
