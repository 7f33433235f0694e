//! One queued request and the slot its caller waits on.
//!
//! A request moves from queued to in-flight when the worker picks it up, or
//! from queued to abandoned when its caller gives up first. The two moves
//! race on one atomic, so an abandoned request is never written and an
//! in-flight one is never abandoned.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use finchlink_frame::{Command, Reply};

use crate::error::{ChannelError, Result};

const QUEUED: u8 = 0;
const IN_FLIGHT: u8 = 1;
const ABANDONED: u8 = 2;

pub(crate) type Outcome = Result<Option<Reply>>;

pub(crate) struct PendingRequest {
    pub(crate) command: Command,
    phase: Arc<AtomicU8>,
    slot: SyncSender<Outcome>,
    queued_at: Instant,
}

pub(crate) struct Waiter {
    phase: Arc<AtomicU8>,
    slot: Receiver<Outcome>,
}

impl PendingRequest {
    pub(crate) fn new(command: Command) -> (Self, Waiter) {
        let phase = Arc::new(AtomicU8::new(QUEUED));
        let (tx, rx) = mpsc::sync_channel(1);
        let request = Self {
            command,
            phase: Arc::clone(&phase),
            slot: tx,
            queued_at: Instant::now(),
        };
        (request, Waiter { phase, slot: rx })
    }

    /// Claim the request for I/O. False if the caller already gave up.
    pub(crate) fn begin(&self) -> bool {
        self.phase
            .compare_exchange(QUEUED, IN_FLIGHT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn queued_for(&self) -> Duration {
        self.queued_at.elapsed()
    }

    /// Hand the outcome to the caller. A caller that stopped waiting is fine.
    pub(crate) fn deliver(self, outcome: Outcome) {
        let _ = self.slot.try_send(outcome);
    }
}

impl Waiter {
    /// Wait for the outcome.
    ///
    /// `queue_timeout` bounds the whole wait for a request still queued when
    /// it expires. Once the worker has started the cycle, the cycle is
    /// allowed up to `cycle_bound` more to finish.
    pub(crate) fn wait(self, queue_timeout: Duration, cycle_bound: Duration) -> Outcome {
        match self.slot.recv_timeout(queue_timeout) {
            Ok(outcome) => return outcome,
            Err(RecvTimeoutError::Disconnected) => return Err(dropped()),
            Err(RecvTimeoutError::Timeout) => {}
        }

        if self
            .phase
            .compare_exchange(QUEUED, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return Err(ChannelError::TimedOut(queue_timeout));
        }

        match self.slot.recv_timeout(cycle_bound) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::TimedOut(queue_timeout + cycle_bound)),
            Err(RecvTimeoutError::Disconnected) => Err(dropped()),
        }
    }
}

fn dropped() -> ChannelError {
    ChannelError::Disconnected("request dropped before completion".to_string())
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn request() -> (PendingRequest, Waiter) {
        PendingRequest::new(finchlink_frame::commands::temperature())
    }

    #[test]
    fn delivered_outcome_reaches_waiter() {
        let (request, waiter) = request();
        assert!(request.begin());
        request.deliver(Ok(Some(Reply::new(b'T', vec![127]))));

        let reply = waiter
            .wait(Duration::from_millis(100), Duration::from_millis(100))
            .expect("outcome should be delivered")
            .expect("reply should be present");
        assert_eq!(reply.bytes(), &[127]);
    }

    #[test]
    fn abandoned_request_is_never_started() {
        let (request, waiter) = request();
        let err = waiter
            .wait(Duration::from_millis(10), Duration::from_millis(10))
            .expect_err("nothing was delivered");
        assert!(matches!(err, ChannelError::TimedOut(_)));
        assert!(!request.begin());
    }

    #[test]
    fn in_flight_request_gets_extra_time() {
        let (request, waiter) = request();
        assert!(request.begin());

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            request.deliver(Ok(None));
        });

        let outcome = waiter.wait(Duration::from_millis(10), Duration::from_secs(2));
        assert!(matches!(outcome, Ok(None)));
        worker.join().expect("worker thread should complete");
    }

    #[test]
    fn dropped_request_reports_disconnect() {
        let (request, waiter) = request();
        drop(request);
        let err = waiter
            .wait(Duration::from_secs(1), Duration::from_secs(1))
            .expect_err("request was dropped");
        assert!(err.is_disconnect());
    }

    #[test]
    fn deliver_after_waiter_left_is_harmless() {
        let (request, waiter) = request();
        drop(waiter);
        assert!(request.begin());
        request.deliver(Ok(None));
    }
}
