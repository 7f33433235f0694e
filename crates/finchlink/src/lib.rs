//! Thread-safe command transport for the Finch robot.
//!
//! finchlink drives a Finch over a serial link: LED, buzzer, wheels, and the
//! light, obstacle, temperature, and acceleration sensors. Any number of
//! threads can share one robot; commands are serialized onto the link and
//! every caller gets its own reply.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-stream links (serial port, simulator)
//! - [`frame`]: Command/reply frames, colors, sensor decoding
//! - [`channel`]: Serialized command channel and connection lifecycle
//! - [`device`]: Typed robot facade (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use finchlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use finchlink_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use finchlink_channel::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use finchlink_device::*;
}
