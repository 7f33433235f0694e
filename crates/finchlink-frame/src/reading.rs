//! Typed sensor readings decoded from reply bytes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{FrameError, Result};

/// Full-scale accelerometer range in G over 32 raw steps.
const ACCEL_G_PER_STEP: f64 = 1.6 / 32.0;
/// Tap event flag in the accelerometer status byte.
pub const TAP_FLAG: u8 = 0x20;
/// Shake event flag in the accelerometer status byte.
pub const SHAKE_FLAG: u8 = 0x80;

/// Any decoded sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum Reading {
    Light(LightReading),
    Obstacle(ObstacleReading),
    Temperature(Temperature),
    Acceleration(Acceleration),
}

/// Light levels, 0.0 (dark) to 1.0 (bright).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightReading {
    pub left: f64,
    pub right: f64,
}

impl LightReading {
    pub fn from_raw(raw: [u8; 2]) -> Self {
        Self {
            left: f64::from(raw[0]) / 255.0,
            right: f64::from(raw[1]) / 255.0,
        }
    }
}

/// Obstacle detection, `true` when something is in front of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObstacleReading {
    pub left: bool,
    pub right: bool,
}

impl ObstacleReading {
    pub fn from_raw(raw: [u8; 2]) -> Self {
        Self {
            left: raw[0] != 0,
            right: raw[1] != 0,
        }
    }
}

/// Temperature as measured by the on-board sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Temperature {
    celsius: f64,
}

impl Temperature {
    /// Convert the raw sensor byte: `(raw - 127) / 2.4 + 25` °C.
    pub fn from_raw(raw: u8) -> Self {
        Self {
            celsius: (f64::from(raw) - 127.0) / 2.4 + 25.0,
        }
    }

    pub fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius * 9.0 / 5.0 + 32.0
    }

    pub fn kelvin(&self) -> f64 {
        self.celsius + 273.15
    }

    /// The temperature expressed in `unit`.
    pub fn in_unit(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.celsius(),
            TemperatureUnit::Fahrenheit => self.fahrenheit(),
            TemperatureUnit::Kelvin => self.kelvin(),
        }
    }
}

/// Unit for presenting a [`Temperature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            "k" | "kelvin" => Ok(TemperatureUnit::Kelvin),
            other => Err(FrameError::invalid(format!(
                "unknown temperature unit '{other}' (expected celsius, fahrenheit, or kelvin)"
            ))),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        })
    }
}

/// Accelerometer sample in G, plus tap/shake events.
///
/// Flat on a table: z ≈ 1, x and y ≈ 0. Standing on its tail: x ≈ -1.
/// Left wing down: y ≈ 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub tap: bool,
    pub shake: bool,
}

impl Acceleration {
    /// Decode the 5-byte reply: unused, x, y, z, status.
    pub fn from_raw(raw: [u8; 5]) -> Self {
        let status = raw[4];
        Self {
            x: raw_to_g(raw[1]),
            y: raw_to_g(raw[2]),
            z: raw_to_g(raw[3]),
            tap: status & TAP_FLAG != 0,
            shake: status & SHAKE_FLAG != 0,
        }
    }
}

/// Convert a 6-bit raw axis value to G.
///
/// Values above 31 wrap to negative (`a - 64`), giving a range of -32..=31
/// steps of 0.05 G.
pub fn raw_to_g(raw: u8) -> f64 {
    let steps = if raw > 31 {
        i16::from(raw) - 64
    } else {
        i16::from(raw)
    };
    f64::from(steps) * ACCEL_G_PER_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn light_scales_to_unit_range() {
        let reading = LightReading::from_raw([0, 255]);
        assert_eq!(reading.left, 0.0);
        assert_eq!(reading.right, 1.0);
        assert!(approx(LightReading::from_raw([51, 0]).left, 0.2));
    }

    #[test]
    fn obstacle_is_nonzero() {
        assert_eq!(
            ObstacleReading::from_raw([0, 7]),
            ObstacleReading {
                left: false,
                right: true
            }
        );
    }

    #[test]
    fn temperature_midpoint_is_exactly_25c() {
        assert_eq!(Temperature::from_raw(127).celsius(), 25.0);
    }

    #[test]
    fn temperature_unit_conversions() {
        for raw in [0u8, 50, 127, 200, 255] {
            let t = Temperature::from_raw(raw);
            let c = t.celsius();
            assert!(approx(t.fahrenheit(), c * 9.0 / 5.0 + 32.0));
            assert!(approx(t.kelvin(), c + 273.15));
            assert!(approx(t.in_unit(TemperatureUnit::Kelvin), c + 273.15));
        }
        assert!(approx(Temperature::from_celsius(100.0).fahrenheit(), 212.0));
    }

    #[test]
    fn temperature_unit_parses_names_and_letters() {
        assert_eq!(
            "Fahrenheit".parse::<TemperatureUnit>().unwrap(),
            TemperatureUnit::Fahrenheit
        );
        assert_eq!("k".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Kelvin);
        assert_eq!(
            " celsius ".parse::<TemperatureUnit>().unwrap(),
            TemperatureUnit::Celsius
        );
        assert!(matches!(
            "rankine".parse::<TemperatureUnit>(),
            Err(FrameError::InvalidCommand(_))
        ));
    }

    #[test]
    fn acceleration_wraps_and_scales() {
        assert_eq!(raw_to_g(0), 0.0);
        assert!(approx(raw_to_g(32), -1.6));
        assert!(approx(raw_to_g(31), 1.55));
        assert!(approx(raw_to_g(63), -0.05));
        assert!(approx(raw_to_g(20), 1.0));
    }

    #[test]
    fn acceleration_flags() {
        let a = Acceleration::from_raw([0, 0, 0, 20, TAP_FLAG]);
        assert!(a.tap);
        assert!(!a.shake);
        assert!(approx(a.z, 1.0));

        let a = Acceleration::from_raw([0, 0, 0, 0, SHAKE_FLAG | TAP_FLAG]);
        assert!(a.tap && a.shake);

        let a = Acceleration::from_raw([0xFF, 0, 0, 0, 0x5F]);
        assert!(!a.tap && !a.shake);
    }

    #[test]
    fn readings_serialize_with_sensor_tag() {
        let json = serde_json::to_value(Reading::Obstacle(ObstacleReading {
            left: true,
            right: false,
        }))
        .unwrap();
        assert_eq!(json["sensor"], "obstacle");
        assert_eq!(json["left"], true);
    }
}
