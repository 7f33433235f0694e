//! Typed facade over a Finch robot.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use finchlink_channel::ChannelConfig;
//! use finchlink_device::Finch;
//! use finchlink_transport::SerialConfig;
//!
//! let finch = Finch::open_serial(SerialConfig::new("/dev/ttyUSB0"), ChannelConfig::default())?;
//! finch.led_str("green")?;
//! finch.wheels(0.5, 0.5)?;
//! std::thread::sleep(Duration::from_secs(1));
//! finch.halt()?;
//! println!("{:.1} °C", finch.temperature()?.celsius());
//! # Ok::<(), finchlink_channel::ChannelError>(())
//! ```

pub mod estimate;
pub mod finch;

pub use estimate::{estimate_distance, estimate_time, DistanceUnit};
pub use finch::{Finch, SensorSnapshot, BUZZER_DELAY_MARGIN};
