use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::opcode::{Opcode, MAX_PAYLOAD, MAX_REPLY};
use crate::reading::{Acceleration, LightReading, ObstacleReading, Reading, Temperature};

/// One command frame, ready to be written.
///
/// Immutable once built. The opcode fixes whether a reply follows and how
/// long it is, so the frame itself carries no header beyond the opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    opcode: u8,
    payload: Bytes,
    reply_len: usize,
}

impl Command {
    /// Build a catalogue command, checking the payload length.
    pub fn new(opcode: Opcode, payload: &[u8]) -> Result<Self> {
        if payload.len() != opcode.payload_len() {
            return Err(FrameError::invalid(format!(
                "{opcode} takes {} payload bytes, got {}",
                opcode.payload_len(),
                payload.len()
            )));
        }
        Ok(Self {
            opcode: opcode.as_byte(),
            payload: Bytes::copy_from_slice(payload),
            reply_len: opcode.reply_len(),
        })
    }

    /// Builders in this crate pass payloads whose length is fixed by type.
    pub(crate) fn from_catalogue(opcode: Opcode, payload: &[u8]) -> Self {
        debug_assert_eq!(payload.len(), opcode.payload_len());
        Self {
            opcode: opcode.as_byte(),
            payload: Bytes::copy_from_slice(payload),
            reply_len: opcode.reply_len(),
        }
    }

    /// Build a command outside the catalogue.
    ///
    /// Useful for firmware extensions; only the frame limits are checked.
    pub fn custom(opcode: u8, payload: &[u8], reply_len: usize) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::invalid(format!(
                "payload too large ({} bytes, max {MAX_PAYLOAD})",
                payload.len()
            )));
        }
        if reply_len > MAX_REPLY {
            return Err(FrameError::invalid(format!(
                "reply too large ({reply_len} bytes, max {MAX_REPLY})"
            )));
        }
        Ok(Self {
            opcode,
            payload: Bytes::copy_from_slice(payload),
            reply_len,
        })
    }

    /// The opcode byte.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// The parameter bytes following the opcode.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether the device answers this command.
    pub fn expects_reply(&self) -> bool {
        self.reply_len > 0
    }

    /// Length of the reply, zero if none.
    pub fn reply_len(&self) -> usize {
        self.reply_len
    }

    /// Total bytes on the wire.
    pub fn wire_size(&self) -> usize {
        1 + self.payload.len()
    }

    /// Append the wire form to `dst`.
    ///
    /// ```text
    /// ┌──────────┬────────────────────────┐
    /// │ Opcode   │ Payload (0-8 bytes,    │
    /// │ (1B)     │ length fixed by opcode)│
    /// └──────────┴────────────────────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_u8(self.opcode);
        dst.put_slice(&self.payload);
    }

    /// The wire form as a standalone buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Raw reply bytes paired with the opcode that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    opcode: u8,
    bytes: Bytes,
}

impl Reply {
    /// Wrap reply bytes for `opcode`.
    pub fn new(opcode: u8, bytes: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            bytes: bytes.into(),
        }
    }

    /// The opcode that was answered.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// The reply bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the reply bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Decode into a typed sensor reading.
    pub fn decode(&self) -> Result<Reading> {
        decode_reply(Opcode::from_byte(self.opcode)?, &self.bytes)
    }
}

/// Encode a catalogue command straight into `dst`.
pub fn encode_command(opcode: Opcode, params: &[u8], dst: &mut BytesMut) -> Result<()> {
    Command::new(opcode, params)?.encode(dst);
    Ok(())
}

/// Decode the reply to a query opcode.
pub fn decode_reply(opcode: Opcode, raw: &[u8]) -> Result<Reading> {
    check_reply_len(opcode, raw)?;
    let reading = match opcode {
        Opcode::Light => Reading::Light(LightReading::from_raw([raw[0], raw[1]])),
        Opcode::Obstacle => Reading::Obstacle(ObstacleReading::from_raw([raw[0], raw[1]])),
        Opcode::Temperature => Reading::Temperature(Temperature::from_raw(raw[0])),
        Opcode::Acceleration => Reading::Acceleration(Acceleration::from_raw([
            raw[0], raw[1], raw[2], raw[3], raw[4],
        ])),
        Opcode::Led | Opcode::Buzzer | Opcode::Motor | Opcode::Halt => {
            return Err(FrameError::invalid(format!("{opcode} has no reply")))
        }
    };
    Ok(reading)
}

/// Check that `raw` has exactly the reply length of `opcode`.
pub fn check_reply_len(opcode: Opcode, raw: &[u8]) -> Result<()> {
    if opcode.expects_reply() && raw.len() != opcode.reply_len() {
        return Err(FrameError::MalformedReply {
            opcode: opcode.as_byte(),
            expected: opcode.reply_len(),
            actual: raw.len(),
        });
    }
    Ok(())
}
