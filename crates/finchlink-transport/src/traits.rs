use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Default bound on waiting for a reply.
///
/// The robot answers queries within a few milliseconds; this leaves a wide
/// margin for USB-serial adapters that batch input.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// An exclusively owned byte-stream connection to the robot.
///
/// Implementations own the OS-level handle for as long as the link is open
/// and never hand it out. `open` and `close` are idempotent: opening an open
/// link and closing a closed link both succeed without side effects.
pub trait Link: Send {
    /// Open the underlying device.
    fn open(&mut self) -> Result<()>;

    /// Close the underlying device, releasing the handle.
    fn close(&mut self);

    /// Whether the link currently holds an open handle.
    fn is_open(&self) -> bool;

    /// Write one complete frame.
    ///
    /// Returns `LinkError::PartialWrite` if the frame could not be written in
    /// full. The remainder is never resumed.
    fn write(&mut self, frame: &[u8]) -> Result<()>;

    /// Read exactly `expected_len` bytes, waiting at most `timeout`.
    fn read(&mut self, expected_len: usize, timeout: Duration) -> Result<Bytes>;

    /// Drop any input bytes that arrived but were never consumed.
    fn discard_input(&mut self) -> Result<()>;

    /// Human-readable name for diagnostics.
    fn describe(&self) -> String;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write(&mut self, frame: &[u8]) -> Result<()> {
        (**self).write(frame)
    }

    fn read(&mut self, expected_len: usize, timeout: Duration) -> Result<Bytes> {
        (**self).read(expected_len, timeout)
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
