//! Dead-reckoning estimates for wheel travel.
//!
//! These are rough calibration figures for a Finch on a hard floor, not
//! measurements.

use std::fmt;
use std::str::FromStr;

use finchlink_frame::FrameError;
use serde::Serialize;

/// Feet travelled per second at full throttle.
pub const FEET_PER_SECOND_AT_FULL_SPEED: f64 = 0.8;
/// Seconds needed to travel one foot.
pub const SECONDS_PER_FOOT: f64 = 1.25;

/// Unit for distance estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Feet,
    Inches,
    Centimeters,
    Meters,
}

impl DistanceUnit {
    /// Convert a distance in feet to this unit.
    pub fn from_feet(self, feet: f64) -> f64 {
        match self {
            DistanceUnit::Feet => feet,
            DistanceUnit::Inches => feet * 12.0,
            DistanceUnit::Centimeters => feet * 30.48,
            DistanceUnit::Meters => feet / 3.281,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            DistanceUnit::Feet => "ft",
            DistanceUnit::Inches => "in",
            DistanceUnit::Centimeters => "cm",
            DistanceUnit::Meters => "m",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ft" | "feet" => Ok(DistanceUnit::Feet),
            "in" | "inches" => Ok(DistanceUnit::Inches),
            "cm" | "centimeters" => Ok(DistanceUnit::Centimeters),
            "m" | "meters" => Ok(DistanceUnit::Meters),
            other => Err(FrameError::InvalidCommand(format!(
                "unknown distance unit '{other}' (expected feet, inches, centimeters, or meters)"
            ))),
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceUnit::Feet => "feet",
            DistanceUnit::Inches => "inches",
            DistanceUnit::Centimeters => "centimeters",
            DistanceUnit::Meters => "meters",
        })
    }
}

/// Distance covered in `seconds` with both wheels at `speed` (0.0-1.0).
pub fn estimate_distance(seconds: f64, speed: f64, unit: DistanceUnit) -> f64 {
    unit.from_feet(FEET_PER_SECOND_AT_FULL_SPEED * speed * seconds)
}

/// Seconds needed to travel `feet`.
pub fn estimate_time(feet: f64) -> f64 {
    feet * SECONDS_PER_FOOT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_in_each_unit() {
        assert!(approx(estimate_distance(10.0, 0.5, DistanceUnit::Feet), 4.0));
        assert!(approx(estimate_distance(10.0, 0.5, DistanceUnit::Inches), 48.0));
        assert!(approx(
            estimate_distance(10.0, 0.5, DistanceUnit::Centimeters),
            121.92
        ));
        assert!(approx(
            estimate_distance(10.0, 0.5, DistanceUnit::Meters),
            4.0 / 3.281
        ));
    }

    #[test]
    fn time_per_foot() {
        assert!(approx(estimate_time(4.0), 5.0));
        assert_eq!(estimate_time(0.0), 0.0);
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("CM".parse::<DistanceUnit>().unwrap(), DistanceUnit::Centimeters);
        assert_eq!("inches".parse::<DistanceUnit>().unwrap(), DistanceUnit::Inches);
        assert!(matches!(
            "furlongs".parse::<DistanceUnit>(),
            Err(FrameError::InvalidCommand(_))
        ));
    }
}
