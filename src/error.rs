/*
 * Error type shared by the crate's fallible operations. Most of the message
 * handling path is infallible by construction (missing capabilities fall back,
 * unknown handles forward), so errors only surface from setup-time calls such
 * as attaching the hook to a native window.
 */
use crate::types::WindowHandle;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("invalid window handle {0}")]
    InvalidHandle(WindowHandle),
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
