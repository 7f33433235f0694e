//! In-process stand-in for the robot.
//!
//! [`SimulatedLink`] answers query frames the way the firmware does, and can
//! be scripted with a custom responder to inject silence, delays, short
//! writes, and I/O failures. A cloneable [`SimHandle`] observes what was
//! written and adjusts sensor values while the link is owned elsewhere.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::{LinkError, Result};
use crate::traits::Link;

/// How the simulated device reacts to one written frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimResponse {
    /// Accept the frame and send nothing back.
    Silent,
    /// Accept the frame and reply immediately.
    Reply(Vec<u8>),
    /// Accept the frame and reply after a delay.
    Delayed(Duration, Vec<u8>),
    /// Accept only the first `n` bytes, then stall.
    Partial(usize),
    /// Fail the write with an I/O error of this kind.
    Fail(std::io::ErrorKind),
}

/// Raw sensor values reported by the simulated robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSensors {
    /// Light sensors (left, right).
    pub light: [u8; 2],
    /// Obstacle sensors (left, right), nonzero means blocked.
    pub obstacle: [u8; 2],
    /// Raw temperature byte.
    pub temperature: u8,
    /// Raw accelerometer axes (x, y, z), each 0-63.
    pub acceleration: [u8; 3],
    /// Accelerometer status flags.
    pub accel_status: u8,
}

impl Default for SimSensors {
    fn default() -> Self {
        // Resting flat on a desk at 25 °C in a lit room.
        Self {
            light: [128, 128],
            obstacle: [0, 0],
            temperature: 127,
            acceleration: [0, 0, 20],
            accel_status: 0,
        }
    }
}

type Responder = Box<dyn FnMut(&[u8], &SimSensors) -> SimResponse + Send>;

struct PendingBytes {
    ready_at: Instant,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct SimState {
    written: Vec<Vec<u8>>,
    inbound: VecDeque<PendingBytes>,
    sensors: SimSensors,
    opens: usize,
    closes: usize,
    fail_next_open: Option<std::io::ErrorKind>,
}

/// Simulated robot link.
pub struct SimulatedLink {
    state: Arc<Mutex<SimState>>,
    responder: Responder,
    open: bool,
    name: String,
}

/// Observer/controller for a [`SimulatedLink`] owned by someone else.
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedLink {
    /// A simulated robot that answers queries from its sensor table.
    pub fn finch() -> Self {
        Self::with_responder(finch_response)
    }

    /// A simulated device driven by a custom responder.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8], &SimSensors) -> SimResponse + Send + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            responder: Box::new(responder),
            open: false,
            name: "sim".to_string(),
        }
    }

    /// A device that never answers.
    pub fn silent() -> Self {
        Self::with_responder(|_, _| SimResponse::Silent)
    }

    /// Rename the link in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// A handle sharing this link's state.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }
}

impl SimHandle {
    /// Every frame written so far, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        lock(&self.state).written.clone()
    }

    /// Forget recorded frames.
    pub fn clear_written(&self) {
        lock(&self.state).written.clear();
    }

    /// Number of successful opens.
    pub fn opens(&self) -> usize {
        lock(&self.state).opens
    }

    /// Number of closes of an open link.
    pub fn closes(&self) -> usize {
        lock(&self.state).closes
    }

    /// Replace the sensor table.
    pub fn set_sensors(&self, sensors: SimSensors) {
        lock(&self.state).sensors = sensors;
    }

    /// Current sensor table.
    pub fn sensors(&self) -> SimSensors {
        lock(&self.state).sensors
    }

    /// Make the next `open` fail with the given error kind.
    pub fn fail_next_open(&self, kind: std::io::ErrorKind) {
        lock(&self.state).fail_next_open = Some(kind);
    }

    /// Queue unsolicited bytes, as if the device sent them on its own.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.state).inbound.push_back(PendingBytes {
            ready_at: Instant::now(),
            bytes: bytes.to_vec(),
        });
    }

    /// Bytes queued for reading, ready or not.
    pub fn pending_input(&self) -> usize {
        lock(&self.state)
            .inbound
            .iter()
            .map(|chunk| chunk.bytes.len())
            .sum()
    }
}

impl Link for SimulatedLink {
    fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        let mut state = self.state();
        if let Some(kind) = state.fail_next_open.take() {
            return Err(LinkError::Open {
                port: self.name.clone(),
                source: std::io::Error::from(kind),
            });
        }
        state.opens += 1;
        state.inbound.clear();
        drop(state);

        self.open = true;
        debug!(link = %self.name, "opened simulated link");
        Ok(())
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut state = self.state();
        state.closes += 1;
        state.inbound.clear();
        debug!(link = %self.name, "closed simulated link");
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, frame: &[u8]) -> Result<()> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }

        let sensors = self.state().sensors;
        let response = (self.responder)(frame, &sensors);
        trace!(frame = ?frame, ?response, "simulated write");

        let mut state = self.state();
        let now = Instant::now();
        match response {
            SimResponse::Fail(kind) => return Err(LinkError::Io(std::io::Error::from(kind))),
            SimResponse::Partial(n) => {
                let written = n.min(frame.len());
                state.written.push(frame[..written].to_vec());
                return Err(LinkError::PartialWrite {
                    written,
                    expected: frame.len(),
                });
            }
            SimResponse::Silent => {}
            SimResponse::Reply(bytes) => state.inbound.push_back(PendingBytes {
                ready_at: now,
                bytes,
            }),
            SimResponse::Delayed(delay, bytes) => state.inbound.push_back(PendingBytes {
                ready_at: now + delay,
                bytes,
            }),
        }
        state.written.push(frame.to_vec());
        Ok(())
    }

    fn read(&mut self, expected_len: usize, timeout: Duration) -> Result<Bytes> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }

        let deadline = Instant::now() + timeout;
        let mut out = BytesMut::with_capacity(expected_len);

        loop {
            let now = Instant::now();
            let next_ready = {
                let mut state = self.state();
                while out.len() < expected_len {
                    let Some(chunk) = state.inbound.front_mut() else {
                        break;
                    };
                    if chunk.ready_at > now {
                        break;
                    }
                    let take = (expected_len - out.len()).min(chunk.bytes.len());
                    out.extend_from_slice(&chunk.bytes[..take]);
                    chunk.bytes.drain(..take);
                    if chunk.bytes.is_empty() {
                        state.inbound.pop_front();
                    }
                }
                state.inbound.front().map(|chunk| chunk.ready_at)
            };

            if out.len() == expected_len {
                return Ok(out.freeze());
            }
            if now >= deadline {
                return Err(LinkError::TimedOut {
                    expected: expected_len,
                    received: out.len(),
                    timeout,
                });
            }

            let wake = next_ready.map_or(deadline, |at| at.min(deadline));
            std::thread::sleep(wake.saturating_duration_since(now));
        }
    }

    fn discard_input(&mut self) -> Result<()> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }
        // Only bytes that have arrived can be cleared; delayed replies stay in flight.
        let now = Instant::now();
        let mut state = self.state();
        let mut pending = 0;
        state.inbound.retain(|chunk| {
            let arrived = chunk.ready_at <= now;
            if arrived {
                pending += chunk.bytes.len();
            }
            !arrived
        });
        debug!(pending, "discarded simulated input");
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl std::fmt::Debug for SimulatedLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLink")
            .field("name", &self.name)
            .field("open", &self.open)
            .finish()
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Firmware behaviour: queries answer from the sensor table, everything else is silent.
fn finch_response(frame: &[u8], sensors: &SimSensors) -> SimResponse {
    match frame.first() {
        Some(b'L') => SimResponse::Reply(sensors.light.to_vec()),
        Some(b'I') => SimResponse::Reply(sensors.obstacle.to_vec()),
        Some(b'T') => SimResponse::Reply(vec![sensors.temperature]),
        Some(b'A') => {
            let [x, y, z] = sensors.acceleration;
            SimResponse::Reply(vec![0x99, x, y, z, sensors.accel_status])
        }
        _ => SimResponse::Silent,
    }
}
