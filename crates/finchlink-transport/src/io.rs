//! Frame-at-a-time helpers over `Read`/`Write` streams.
//!
//! Links built on a standard stream use these so that writes are all-or-error
//! and reads are bounded by a single deadline across partial reads.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::warn;

use crate::error::{LinkError, Result};

const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Write one frame in full, then flush.
///
/// A short write is reported as `LinkError::PartialWrite`; the caller must
/// treat the frame as lost rather than resume it.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, frame: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < frame.len() {
        match writer.write(&frame[offset..]) {
            Ok(0) => {
                return Err(LinkError::PartialWrite {
                    written: offset,
                    expected: frame.len(),
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if offset > 0 => {
                warn!(error = %err, written = offset, expected = frame.len(), "write failed mid-frame");
                return Err(LinkError::PartialWrite {
                    written: offset,
                    expected: frame.len(),
                });
            }
            Err(err) => return Err(LinkError::Io(err)),
        }
    }

    loop {
        match writer.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(LinkError::Io(err)),
        }
    }
}

/// Read exactly `expected_len` bytes before `timeout` elapses.
///
/// `set_timeout` is called before every read with the time left, so streams
/// with native timeouts never block past the deadline.
pub fn read_exact_timeout<R, F>(
    reader: &mut R,
    expected_len: usize,
    timeout: Duration,
    mut set_timeout: F,
) -> Result<Bytes>
where
    R: Read + ?Sized,
    F: FnMut(&mut R, Duration) -> std::io::Result<()>,
{
    let deadline = Instant::now() + timeout;
    let mut buf = BytesMut::zeroed(expected_len);
    let mut received = 0usize;

    while received < expected_len {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(LinkError::TimedOut {
                expected: expected_len,
                received,
                timeout,
            });
        }

        set_timeout(reader, remaining)?;
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(LinkError::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "link closed mid-reply",
                )))
            }
            Ok(n) => received += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(WOULD_BLOCK_BACKOFF.min(remaining));
            }
            Err(err) => return Err(LinkError::Io(err)),
        }
    }

    Ok(buf.freeze())
}
