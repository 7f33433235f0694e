use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, trace};

use crate::error::{LinkError, Result};
use crate::io::{read_exact_timeout, write_frame};
use crate::traits::Link;

/// Default baud rate for the robot's USB-serial bridge.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Configuration for a serial link.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
}

impl SerialConfig {
    /// Configuration for `port` with default line settings.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: Duration::from_millis(500),
        }
    }
}

/// Serial link (8N1, no flow control).
///
/// The port handle exists only between `open` and `close`.
pub struct SerialLink {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Create a closed serial link.
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// The configuration this link opens with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(LinkError::NotOpen)
    }
}

impl Link for SerialLink {
    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.write_timeout)
            .open()
            .map_err(|err| LinkError::Open {
                port: self.config.port.clone(),
                source: err.into(),
            })?;

        // Anything buffered before we opened belongs to a previous session.
        port.clear(ClearBuffer::All).map_err(std::io::Error::from)?;

        info!(port = %self.config.port, baud = self.config.baud_rate, "opened serial link");
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!(port = %self.config.port, "closed serial link");
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, frame: &[u8]) -> Result<()> {
        let write_timeout = self.config.write_timeout;
        let port = self.port_mut()?;
        port.set_timeout(write_timeout).map_err(std::io::Error::from)?;
        trace!(frame = ?frame, "serial write");
        write_frame(port, frame)
    }

    fn read(&mut self, expected_len: usize, timeout: Duration) -> Result<Bytes> {
        let port = self.port_mut()?;
        let bytes = read_exact_timeout(port, expected_len, timeout, |port, left| {
            port.set_timeout(left).map_err(std::io::Error::from)
        })?;
        trace!(reply = ?bytes.as_ref(), "serial read");
        Ok(bytes)
    }

    fn discard_input(&mut self) -> Result<()> {
        let port = self.port_mut()?;
        let pending = port.bytes_to_read().unwrap_or(0);
        port.clear(ClearBuffer::Input).map_err(std::io::Error::from)?;
        debug!(pending, "discarded serial input");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("serial:{}@{}", self.config.port, self.config.baud_rate)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.config.port)
            .field("baud_rate", &self.config.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_link_rejects_io() {
        let mut link = SerialLink::new(SerialConfig::new("/dev/finchlink-does-not-exist"));
        assert!(!link.is_open());
        assert!(matches!(link.write(b"X\x00"), Err(LinkError::NotOpen)));
        assert!(matches!(
            link.read(1, Duration::from_millis(1)),
            Err(LinkError::NotOpen)
        ));
        assert!(matches!(link.discard_input(), Err(LinkError::NotOpen)));
    }

    #[test]
    fn open_missing_device_reports_port() {
        let mut link = SerialLink::new(SerialConfig::new("/dev/finchlink-does-not-exist"));
        let err = link.open().unwrap_err();
        match err {
            LinkError::Open { port, .. } => assert_eq!(port, "/dev/finchlink-does-not-exist"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!link.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let mut link = SerialLink::new(SerialConfig::new("/dev/null"));
        link.close();
        link.close();
        assert!(!link.is_open());
    }

    #[test]
    fn describe_names_port_and_speed() {
        let link = SerialLink::new(SerialConfig {
            baud_rate: 9600,
            ..SerialConfig::new("/dev/ttyACM0")
        });
        assert_eq!(link.describe(), "serial:/dev/ttyACM0@9600");
    }
}
