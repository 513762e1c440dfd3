//! Source video URL validation.
//!
//! Only videos hosted on the Sora share domain are accepted. The check is
//! performed before any remote call is attempted, both by the HTTP handler
//! and again by the job submitter.

use crate::error::CoreError;

/// Every accepted video URL must start with this prefix.
pub const TRUSTED_VIDEO_PREFIX: &str = "https://sora.chatgpt.com/";

/// Validate a user-supplied video URL and return it trimmed.
pub fn validate_video_url(url: &str) -> Result<&str, CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("No video URL provided".to_string()));
    }
    if !trimmed.starts_with(TRUSTED_VIDEO_PREFIX) {
        return Err(CoreError::Validation(format!(
            "Invalid Sora URL. Must start with {TRUSTED_VIDEO_PREFIX}"
        )));
    }
    Ok(trimmed)
}
