use std::time::Duration;

/// Errors that can occur on the byte-stream link to the robot.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Failed to open the underlying device.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the open link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The expected reply did not arrive before the deadline.
    #[error("timed out after {timeout:?} ({received} of {expected} bytes received)")]
    TimedOut {
        expected: usize,
        received: usize,
        timeout: Duration,
    },

    /// Only part of a frame reached the device.
    #[error("partial write ({written} of {expected} bytes)")]
    PartialWrite { written: usize, expected: usize },

    /// The link is not open.
    #[error("link is not open")]
    NotOpen,
}

impl LinkError {
    /// Whether this error means the link can no longer be trusted.
    ///
    /// A timeout leaves the byte stream usable once the line has settled;
    /// everything else (unplugged device, broken pipe, half-written frame)
    /// requires the link to be closed and reopened.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LinkError::TimedOut { .. })
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
