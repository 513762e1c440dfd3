//! Processing constants shared by the API server and the poller.

// ---------------------------------------------------------------------------
// History status constants
// ---------------------------------------------------------------------------

/// History entry created, provider not finished yet.
pub const HISTORY_STATUS_PROCESSING: &str = "processing";
/// Provider returned a result.
pub const HISTORY_STATUS_COMPLETED: &str = "completed";
/// Provider (or this server) gave up.
pub const HISTORY_STATUS_FAILED: &str = "failed";

// ---------------------------------------------------------------------------
// Artifact delivery
// ---------------------------------------------------------------------------

/// Filename suggested for artifacts served through the download proxy.
pub const DOWNLOAD_FILENAME: &str = "clean_sora_video.mp4";

/// Filename suggested for artifacts returned directly by the sync path.
pub const DIRECT_DOWNLOAD_FILENAME: &str = "clean_video.mp4";

/// Content type assumed when the provider does not send one.
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Human-readable estimate returned with an accepted async task.
pub const ESTIMATED_PROCESSING_TIME: &str = "10-30 seconds";

/// Message recorded on history entries when the server runs in demo mode.
pub const DEMO_MODE_MESSAGE: &str = "Mock mode enabled";

/// Build an `attachment` content-disposition header value.
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

/// Path under which a completed task's artifact is served.
pub fn download_path(task_id: &str) -> String {
    format!("/download/{task_id}")
}

/// Path the client polls for a task's status.
pub fn poll_path(task_id: &str) -> String {
    format!("/task/{task_id}")
}
