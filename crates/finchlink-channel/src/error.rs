use std::time::Duration;

/// Errors that can occur when submitting commands or changing connection state.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Link-level failure (I/O error, partial write, open failure).
    #[error("link error: {0}")]
    Link(#[from] finchlink_transport::LinkError),

    /// Command could not be built, or a reply could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] finchlink_frame::FrameError),

    /// No reply within the bound.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    /// The connection was never opened, or was closed on purpose.
    #[error("connection is not open")]
    NotOpen,

    /// The connection went away while the request was pending, or is
    /// reconnecting.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// A lifecycle transition did not complete.
    #[error("lifecycle transition failed: {0}")]
    Transition(String),

    /// The background I/O worker could not be started.
    #[error("failed to start I/O worker: {0}")]
    Worker(std::io::Error),
}

impl ChannelError {
    /// Whether the command was rejected locally, before any I/O.
    pub fn is_invalid_command(&self) -> bool {
        matches!(
            self,
            ChannelError::Frame(finchlink_frame::FrameError::InvalidCommand(_))
        )
    }

    /// Whether the request failed because the connection is not usable.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ChannelError::NotOpen | ChannelError::Disconnected(_))
    }

    /// Whether the request ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::TimedOut(_))
    }

    pub(crate) fn worker_stopped() -> Self {
        ChannelError::Disconnected("I/O worker stopped".to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
