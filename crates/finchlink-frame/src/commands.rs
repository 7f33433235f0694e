//! Typed builders for every catalogue command.

use std::time::Duration;

use crate::codec::Command;
use crate::color::Color;
use crate::error::{FrameError, Result};
use crate::opcode::Opcode;

/// Wheel rotation direction as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Forward = 0,
    Reverse = 1,
}

/// Set the beak LED.
pub fn led(color: Color) -> Command {
    command(Opcode::Led, &color.to_bytes())
}

/// Sound the buzzer for `duration` at `frequency_hz`.
///
/// Both values travel as big-endian u16, so durations are limited to
/// 65 535 ms.
pub fn buzzer(duration: Duration, frequency_hz: u16) -> Result<Command> {
    let millis = u16::try_from(duration.as_millis()).map_err(|_| {
        FrameError::invalid(format!(
            "buzzer duration {duration:?} exceeds {} ms",
            u16::MAX
        ))
    })?;
    let [d_hi, d_lo] = millis.to_be_bytes();
    let [f_hi, f_lo] = frequency_hz.to_be_bytes();
    Ok(command(Opcode::Buzzer, &[d_hi, d_lo, f_hi, f_lo]))
}

/// Drive both wheels with explicit direction and speed.
pub fn motor(
    left_dir: Direction,
    left_speed: u8,
    right_dir: Direction,
    right_speed: u8,
) -> Command {
    command(
        Opcode::Motor,
        &[left_dir as u8, left_speed, right_dir as u8, right_speed],
    )
}

/// Drive both wheels from signed throttles in `[-1.0, 1.0]`.
///
/// Negative values reverse. Magnitudes beyond 1.0 saturate at full speed.
pub fn wheels(left: f64, right: f64) -> Result<Command> {
    let (left_dir, left_speed) = throttle("left", left)?;
    let (right_dir, right_speed) = throttle("right", right)?;
    Ok(motor(left_dir, left_speed, right_dir, right_speed))
}

/// Stop both motors and turn the LED off.
pub fn halt() -> Command {
    command(Opcode::Halt, &[0])
}

/// Query the light sensors.
pub fn light() -> Command {
    command(Opcode::Light, &[])
}

/// Query the obstacle sensors.
pub fn obstacle() -> Command {
    command(Opcode::Obstacle, &[])
}

/// Query the temperature sensor.
pub fn temperature() -> Command {
    command(Opcode::Temperature, &[])
}

/// Query the accelerometer.
pub fn acceleration() -> Command {
    command(Opcode::Acceleration, &[])
}

fn throttle(side: &str, value: f64) -> Result<(Direction, u8)> {
    if !value.is_finite() {
        return Err(FrameError::invalid(format!(
            "{side} wheel throttle must be finite, got {value}"
        )));
    }
    let direction = if value < 0.0 {
        Direction::Reverse
    } else {
        Direction::Forward
    };
    // `as` truncates toward zero, matching the firmware's expectations.
    let speed = ((value * 255.0) as i64).unsigned_abs().min(255) as u8;
    Ok((direction, speed))
}

fn command(opcode: Opcode, payload: &[u8]) -> Command {
    Command::from_catalogue(opcode, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_frame_layout() {
        let cmd = motor(Direction::Reverse, 128, Direction::Forward, 200);
        assert_eq!(cmd.to_bytes().as_ref(), &[b'M', 1, 128, 0, 200]);
        assert!(!cmd.expects_reply());
    }

    #[test]
    fn wheels_map_throttle_to_direction_and_speed() {
        let cmd = wheels(-0.5, 1.0).unwrap();
        assert_eq!(cmd.payload(), &[1, 127, 0, 255]);

        let cmd = wheels(0.0, -1.0).unwrap();
        assert_eq!(cmd.payload(), &[0, 0, 1, 255]);

        let cmd = wheels(3.0, -7.5).unwrap();
        assert_eq!(cmd.payload(), &[0, 255, 1, 255]);
    }

    #[test]
    fn wheels_reject_nan() {
        assert!(matches!(
            wheels(f64::NAN, 0.0),
            Err(FrameError::InvalidCommand(_))
        ));
        assert!(wheels(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn buzzer_is_big_endian() {
        let cmd = buzzer(Duration::from_millis(1500), 440).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), &[b'B', 0x05, 0xDC, 0x01, 0xB8]);
    }

    #[test]
    fn buzzer_truncates_sub_millisecond() {
        let cmd = buzzer(Duration::from_micros(2999), 1).unwrap();
        assert_eq!(cmd.payload(), &[0, 2, 0, 1]);
    }

    #[test]
    fn buzzer_rejects_overlong_duration() {
        assert!(buzzer(Duration::from_millis(65_535), 100).is_ok());
        assert!(matches!(
            buzzer(Duration::from_millis(65_536), 100),
            Err(FrameError::InvalidCommand(_))
        ));
    }

    #[test]
    fn led_uses_color_bytes() {
        let cmd = led("#00FF8B".parse().unwrap());
        assert_eq!(cmd.to_bytes().as_ref(), &[b'O', 0x00, 0xFF, 0x8B]);
    }

    #[test]
    fn halt_and_queries() {
        assert_eq!(halt().to_bytes().as_ref(), b"X\x00");
        assert_eq!(light().reply_len(), 2);
        assert_eq!(obstacle().reply_len(), 2);
        assert_eq!(temperature().reply_len(), 1);
        assert_eq!(acceleration().reply_len(), 5);
    }
}
