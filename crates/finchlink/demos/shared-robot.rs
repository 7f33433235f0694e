//! Several threads sharing one robot.
//!
//! One thread polls the temperature, another the accelerometer, while the
//! main thread drives the wheels. Every caller gets its own replies.
//!
//! Run with:
//!   cargo run --example shared-robot

use std::thread;
use std::time::Duration;

use finchlink::channel::ChannelConfig;
use finchlink::device::Finch;
use finchlink::transport::{SerialConfig, SimulatedLink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let finch = match std::env::var("FINCHLINK_PORT") {
        Ok(port) => Finch::open_serial(SerialConfig::new(port), ChannelConfig::default())?,
        Err(_) => Finch::open_link(SimulatedLink::finch(), ChannelConfig::default())?,
    };

    let thermometer = finch.clone();
    let temperatures = thread::spawn(move || {
        for _ in 0..10 {
            match thermometer.temperature() {
                Ok(t) => eprintln!("temperature {:.1} °C", t.celsius()),
                Err(err) => eprintln!("temperature failed: {err}"),
            }
            thread::sleep(Duration::from_millis(100));
        }
    });

    let accelerometer = finch.clone();
    let tilt = thread::spawn(move || {
        for _ in 0..10 {
            match accelerometer.acceleration() {
                Ok(a) => eprintln!("acceleration x={:.2} y={:.2} z={:.2}", a.x, a.y, a.z),
                Err(err) => eprintln!("acceleration failed: {err}"),
            }
            thread::sleep(Duration::from_millis(100));
        }
    });

    finch.wheels(0.4, 0.4)?;
    thread::sleep(Duration::from_millis(500));
    finch.wheels(-0.4, 0.4)?;
    thread::sleep(Duration::from_millis(500));
    finch.halt()?;

    let _ = temperatures.join();
    let _ = tilt.join();
    Ok(())
}
