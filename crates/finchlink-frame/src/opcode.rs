//! Opcode catalogue.
//!
//! Every frame starts with one opcode byte. The opcode alone fixes the
//! request payload length and the reply length, so neither direction carries
//! a length prefix.

use std::fmt;

use serde::Serialize;

use crate::error::{FrameError, Result};

/// Largest request payload any command carries.
pub const MAX_PAYLOAD: usize = 8;

/// Largest reply any query returns.
pub const MAX_REPLY: usize = 8;

/// Known command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
    /// Set the beak LED color.
    Led = b'O',
    /// Sound the buzzer.
    Buzzer = b'B',
    /// Read both light sensors.
    Light = b'L',
    /// Read both obstacle sensors.
    Obstacle = b'I',
    /// Read the temperature sensor.
    Temperature = b'T',
    /// Read the accelerometer.
    Acceleration = b'A',
    /// Drive both wheels.
    Motor = b'M',
    /// Stop motors and turn off the LED.
    Halt = b'X',
}

impl Opcode {
    /// Every opcode in the catalogue.
    pub const ALL: [Opcode; 8] = [
        Opcode::Led,
        Opcode::Buzzer,
        Opcode::Light,
        Opcode::Obstacle,
        Opcode::Temperature,
        Opcode::Acceleration,
        Opcode::Motor,
        Opcode::Halt,
    ];

    /// The wire byte.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by wire byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_byte() == byte)
            .ok_or(FrameError::UnknownOpcode(byte))
    }

    /// Request payload length in bytes.
    pub const fn payload_len(self) -> usize {
        match self {
            Opcode::Led => 3,
            Opcode::Buzzer | Opcode::Motor => 4,
            Opcode::Halt => 1,
            Opcode::Light | Opcode::Obstacle | Opcode::Temperature | Opcode::Acceleration => 0,
        }
    }

    /// Reply length in bytes; zero for commands that are never answered.
    pub const fn reply_len(self) -> usize {
        match self {
            Opcode::Light | Opcode::Obstacle => 2,
            Opcode::Temperature => 1,
            Opcode::Acceleration => 5,
            Opcode::Led | Opcode::Buzzer | Opcode::Motor | Opcode::Halt => 0,
        }
    }

    /// Whether the device answers this opcode.
    pub const fn expects_reply(self) -> bool {
        self.reply_len() > 0
    }

    /// Short lowercase name for logs and output.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Led => "led",
            Opcode::Buzzer => "buzzer",
            Opcode::Light => "light",
            Opcode::Obstacle => "obstacle",
            Opcode::Temperature => "temperature",
            Opcode::Acceleration => "acceleration",
            Opcode::Motor => "motor",
            Opcode::Halt => "halt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ('{}')", self.name(), self.as_byte() as char)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = FrameError;

    fn try_from(byte: u8) -> Result<Self> {
        Self::from_byte(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes_match_catalogue() {
        assert_eq!(Opcode::Led.as_byte(), b'O');
        assert_eq!(Opcode::Buzzer.as_byte(), b'B');
        assert_eq!(Opcode::Light.as_byte(), b'L');
        assert_eq!(Opcode::Obstacle.as_byte(), b'I');
        assert_eq!(Opcode::Temperature.as_byte(), b'T');
        assert_eq!(Opcode::Acceleration.as_byte(), b'A');
        assert_eq!(Opcode::Motor.as_byte(), b'M');
        assert_eq!(Opcode::Halt.as_byte(), b'X');
    }

    #[test]
    fn from_byte_roundtrips_catalogue() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.as_byte()).unwrap(), op);
        }
        assert!(matches!(
            Opcode::from_byte(b'Z'),
            Err(FrameError::UnknownOpcode(b'Z'))
        ));
    }

    #[test]
    fn only_sensor_queries_expect_replies() {
        let queries: Vec<_> = Opcode::ALL
            .into_iter()
            .filter(|op| op.expects_reply())
            .collect();
        assert_eq!(
            queries,
            vec![
                Opcode::Light,
                Opcode::Obstacle,
                Opcode::Temperature,
                Opcode::Acceleration
            ]
        );
        for op in queries {
            assert_eq!(op.payload_len(), 0);
        }
    }

    #[test]
    fn lengths_fit_frame_limits() {
        for op in Opcode::ALL {
            assert!(op.payload_len() <= MAX_PAYLOAD);
            assert!(op.reply_len() <= MAX_REPLY);
        }
    }

    #[test]
    fn display_includes_wire_char() {
        assert_eq!(Opcode::Motor.to_string(), "motor ('M')");
    }
}
