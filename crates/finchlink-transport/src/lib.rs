//! Byte-stream link to a Finch robot.
//!
//! This is the lowest layer of finchlink and the only one that touches
//! physical I/O. Two links are provided:
//! - [`SerialLink`] over a serial port
//! - [`SimulatedLink`], an in-process device for tests and dry runs
//!
//! Everything else builds on the [`Link`] trait provided here.

pub mod error;
pub mod io;
pub mod serial;
pub mod sim;
pub mod traits;

pub use error::{LinkError, Result};
pub use serial::{SerialConfig, SerialLink, DEFAULT_BAUD_RATE};
pub use sim::{SimHandle, SimResponse, SimSensors, SimulatedLink};
pub use traits::{Link, DEFAULT_READ_TIMEOUT};
