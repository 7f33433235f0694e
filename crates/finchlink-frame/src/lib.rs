//! Fixed-format command and reply frames for the Finch robot.
//!
//! A request frame is one opcode byte followed by 0-8 parameter bytes. A
//! reply, sent only for sensor queries, is a fixed number of bytes with no
//! header. Frame boundaries come purely from the per-opcode lengths in
//! [`Opcode`], so everything here is pure: no state, no I/O.

pub mod codec;
pub mod color;
pub mod commands;
pub mod error;
pub mod opcode;
pub mod reading;

pub use codec::{check_reply_len, decode_reply, encode_command, Command, Reply};
pub use color::{Color, NAMED_COLORS};
pub use commands::Direction;
pub use error::{FrameError, Result};
pub use opcode::{Opcode, MAX_PAYLOAD, MAX_REPLY};
pub use reading::{
    raw_to_g, Acceleration, LightReading, ObstacleReading, Reading, Temperature, TemperatureUnit,
};
