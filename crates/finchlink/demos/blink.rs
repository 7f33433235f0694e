//! Cycle the beak LED through every named color.
//!
//! Run with:
//!   FINCHLINK_PORT=/dev/ttyUSB0 cargo run --example blink
//!
//! Without FINCHLINK_PORT the in-process simulator is used.

use std::time::Duration;

use finchlink::channel::ChannelConfig;
use finchlink::device::Finch;
use finchlink::frame::NAMED_COLORS;
use finchlink::transport::{SerialConfig, SimulatedLink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let finch = match std::env::var("FINCHLINK_PORT") {
        Ok(port) => Finch::open_serial(SerialConfig::new(port), ChannelConfig::default())?,
        Err(_) => Finch::open_link(SimulatedLink::finch(), ChannelConfig::default())?,
    };

    for (name, color) in NAMED_COLORS {
        eprintln!("{name:>7} {color}");
        finch.led(color)?;
        std::thread::sleep(Duration::from_millis(300));
    }

    finch.halt()?;
    finch.close()?;
    Ok(())
}
