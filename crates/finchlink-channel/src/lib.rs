//! Serialized command channel for a Finch link.
//!
//! Any number of threads may submit commands. A single I/O worker owns the
//! link and runs one write-then-read cycle at a time, in arrival order, so
//! replies are never mixed up between callers. [`Connection`] adds the
//! open/closed lifecycle on top.

pub mod channel;
pub mod config;
pub mod connection;
pub mod error;
pub mod lifecycle;
mod pending;
mod worker;

pub use channel::CommandChannel;
pub use config::ChannelConfig;
pub use connection::Connection;
pub use error::{ChannelError, Result};
pub use lifecycle::ConnectionState;
