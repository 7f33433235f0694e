/// Errors that can occur while building commands or decoding replies.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Parameters do not describe a valid command. Never reaches the link.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The byte is not a known opcode.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// A reply had the wrong length for its opcode.
    #[error("malformed reply to opcode {opcode:#04x} ({actual} bytes, expected {expected})")]
    MalformedReply {
        opcode: u8,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FrameError::InvalidCommand(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
