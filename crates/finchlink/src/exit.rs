use std::fmt;

use finchlink_channel::ChannelError;
use finchlink_frame::FrameError;
use finchlink_transport::LinkError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const LINK_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    let code = match err {
        LinkError::TimedOut { .. } => TIMEOUT,
        _ => LINK_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match err {
        FrameError::MalformedReply { .. } => DATA_INVALID,
        FrameError::InvalidCommand(_) | FrameError::UnknownOpcode(_) => USAGE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Link(err) => link_error(context, err),
        ChannelError::Frame(err) => frame_error(context, err),
        ChannelError::TimedOut(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ChannelError::NotOpen | ChannelError::Disconnected(_) | ChannelError::Transition(_) => {
            CliError::new(LINK_ERROR, format!("{context}: {err}"))
        }
        ChannelError::Worker(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn channel_errors_map_to_exit_codes() {
        let cases = [
            (ChannelError::TimedOut(Duration::from_millis(500)), TIMEOUT),
            (ChannelError::NotOpen, LINK_ERROR),
            (ChannelError::Disconnected("unplugged".into()), LINK_ERROR),
            (
                ChannelError::Frame(FrameError::InvalidCommand("bad color".into())),
                USAGE,
            ),
            (
                ChannelError::Frame(FrameError::MalformedReply {
                    opcode: b'A',
                    expected: 5,
                    actual: 2,
                }),
                DATA_INVALID,
            ),
            (
                ChannelError::Link(LinkError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                ))),
                LINK_ERROR,
            ),
        ];

        for (err, code) in cases {
            let message = err.to_string();
            let cli = channel_error("robot", err);
            assert_eq!(cli.code, code, "{message}");
            assert!(cli.message.starts_with("robot: "));
        }
    }
}
