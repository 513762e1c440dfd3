//! Kie AI provider integration.
//!
//! Provides the REST client for the watermark-removal model, the parser for
//! the provider's completion webhook, and the [`submit::JobSubmitter`] that
//! ties job creation to the task registry.

pub mod api;
pub mod callback;
pub mod submit;
