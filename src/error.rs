use thiserror::Error;

/// Fatal-to-session failures. The session enters `Failed` and all per-frame
/// AR work is suspended until the next explicit resume.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("AR tracking runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    #[error("AR runtime install declined by the user")]
    InstallDeclined,
    #[error("failed to configure tracking session: {0}")]
    Configuration(String),
}

/// Recoverable per-frame failures; the frame is skipped, nothing else
/// changes.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("camera unavailable this frame")]
    CameraUnavailable,
    #[error("anchor no longer known to the tracking runtime")]
    StaleAnchor,
    #[error("tracker rejected the operation: {0}")]
    Tracker(String),
}

/// Content decode/fetch failures, surfaced as a content-error event. No
/// automatic retry.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to decode content from {source_key:?}: {reason}")]
    Decode { source_key: String, reason: String },
    #[error("failed to fetch content from {source_key:?}: {reason}")]
    Fetch { source_key: String, reason: String },
}
