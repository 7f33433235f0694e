//! The I/O worker: the only code that touches the link.
//!
//! Requests are served one at a time in arrival order, so exactly one
//! write-then-read cycle is ever in flight and a reply always belongs to the
//! request that was just written. After a read that timed out or came back
//! short, the worker lets the line settle before taking the next job.

use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;
use std::time::Instant;

use finchlink_frame::{Command, FrameError, Reply};
use finchlink_transport::{Link, LinkError};
use tracing::{debug, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::lifecycle::Lifecycle;
use crate::pending::{Outcome, PendingRequest};

/// Quiet windows a settling line may use up before it is declared out of sync.
const SETTLE_WINDOWS: u32 = 4;

pub(crate) enum Job {
    Submit(PendingRequest),
    Open(SyncSender<std::result::Result<(), LinkError>>),
    Close(SyncSender<()>),
    Shutdown,
}

pub(crate) struct Worker {
    link: Box<dyn Link>,
    lifecycle: Arc<Lifecycle>,
    config: ChannelConfig,
    /// Set after a timed-out or short read; late reply bytes may still arrive.
    stale_input: bool,
}

impl Worker {
    pub(crate) fn new(link: Box<dyn Link>, lifecycle: Arc<Lifecycle>, config: ChannelConfig) -> Self {
        Self {
            link,
            lifecycle,
            config,
            stale_input: false,
        }
    }

    pub(crate) fn run(mut self, jobs: Receiver<Job>) {
        debug!(link = %self.link.describe(), "I/O worker started");
        while let Ok(job) = jobs.recv() {
            match job {
                Job::Submit(request) => self.serve(request),
                Job::Open(ack) => {
                    let result = self.link.open();
                    self.stale_input = false;
                    let _ = ack.try_send(result);
                }
                Job::Close(ack) => {
                    self.link.close();
                    let _ = ack.try_send(());
                }
                Job::Shutdown => break,
            }
        }
        self.link.close();
        debug!(link = %self.link.describe(), "I/O worker stopped");
    }

    fn serve(&mut self, request: PendingRequest) {
        if !request.begin() {
            trace!(opcode = request.command.opcode(), "skipping abandoned request");
            return;
        }

        let generation = match self.lifecycle.admit() {
            Ok(generation) => generation,
            Err(_) => {
                debug!(
                    opcode = request.command.opcode(),
                    "connection closed while request was queued"
                );
                request.deliver(Err(ChannelError::Disconnected(
                    "connection closed before the command was sent".to_string(),
                )));
                return;
            }
        };

        trace!(
            opcode = request.command.opcode(),
            queued_ms = request.queued_for().as_millis() as u64,
            "starting cycle"
        );
        let mut outcome = self.cycle(&request.command, generation);

        // A close that landed mid-cycle wins over whatever the link returned,
        // except for the link failure that caused the close.
        let link_failed = matches!(outcome, Err(ChannelError::Link(_)));
        if !link_failed && !self.lifecycle.is_current(generation) {
            outcome = Err(ChannelError::Disconnected(
                "connection closed during the command".to_string(),
            ));
        }
        request.deliver(outcome);

        if self.stale_input {
            self.settle(generation);
        }
    }

    /// Drains the line until it has been quiet for a whole read window.
    ///
    /// Clearing the input buffer only drops bytes that have already arrived,
    /// so a reply still on its way would otherwise be read as the answer to
    /// the next command.
    fn settle(&mut self, generation: u64) {
        let quiet = self.config.read_timeout;
        let deadline = Instant::now() + quiet * SETTLE_WINDOWS;
        if !self.lifecycle.is_current(generation) {
            self.stale_input = false;
            return;
        }
        if let Err(err) = self.link.discard_input() {
            self.link_failure(generation, err);
            return;
        }

        let mut drained = 0usize;
        loop {
            // A close or restart replaces the link's input anyway.
            if !self.lifecycle.is_current(generation) {
                self.stale_input = false;
                return;
            }
            if Instant::now() >= deadline {
                warn!(drained, "line did not go quiet, closing link");
                self.lifecycle.fault_at(generation, "reply stream out of sync");
                self.link.close();
                self.stale_input = false;
                return;
            }
            match self.link.read(1, quiet) {
                Ok(bytes) => drained += bytes.len(),
                Err(LinkError::TimedOut { received: 0, .. }) => break,
                Err(LinkError::TimedOut { received, .. }) => drained += received,
                Err(err) => {
                    self.link_failure(generation, err);
                    return;
                }
            }
        }

        if drained > 0 {
            warn!(drained, "discarded late reply bytes");
        }
        self.stale_input = false;
    }

    fn cycle(&mut self, command: &Command, generation: u64) -> Outcome {
        let frame = command.to_bytes();
        debug!(opcode = command.opcode(), len = frame.len(), "writing command");
        self.link
            .write(&frame)
            .map_err(|err| self.link_failure(generation, err))?;

        if !command.expects_reply() {
            return Ok(None);
        }

        match self.link.read(command.reply_len(), self.config.read_timeout) {
            Ok(bytes) if bytes.len() == command.reply_len() => {
                trace!(opcode = command.opcode(), reply = ?bytes.as_ref(), "reply received");
                Ok(Some(Reply::new(command.opcode(), bytes)))
            }
            Ok(bytes) => {
                self.stale_input = true;
                Err(FrameError::MalformedReply {
                    opcode: command.opcode(),
                    expected: command.reply_len(),
                    actual: bytes.len(),
                }
                .into())
            }
            Err(LinkError::TimedOut {
                received, timeout, ..
            }) => {
                warn!(
                    opcode = command.opcode(),
                    received,
                    timeout_ms = timeout.as_millis() as u64,
                    "no reply before deadline"
                );
                self.stale_input = true;
                Err(ChannelError::TimedOut(timeout))
            }
            Err(err) => Err(self.link_failure(generation, err)),
        }
    }

    fn link_failure(&mut self, generation: u64, err: LinkError) -> ChannelError {
        if err.is_fatal() {
            self.lifecycle.fault_at(generation, err.to_string());
            self.link.close();
            self.stale_input = false;
        } else {
            self.stale_input = true;
        }
        ChannelError::Link(err)
    }
}

pub(crate) fn spawn(
    link: Box<dyn Link>,
    lifecycle: Arc<Lifecycle>,
    config: ChannelConfig,
    jobs: Receiver<Job>,
) -> Result<std::thread::JoinHandle<()>> {
    let worker = Worker::new(link, lifecycle, config);
    std::thread::Builder::new()
        .name("finchlink-io".to_string())
        .spawn(move || worker.run(jobs))
        .map_err(ChannelError::Worker)
}
