use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use finchlink_frame::{Command, Reply};
use finchlink_transport::Link;
use tracing::{debug, info};

use crate::channel::CommandChannel;
use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::lifecycle::ConnectionState;
use crate::worker::Job;

/// Owns a link and manages its open/closed lifecycle.
///
/// Transitions are serialized: `open`, `close`, and `stop_and_start` never
/// overlap, and commands are only admitted while the state is `Open`.
/// Dropping the last handle (including channel clones) stops the I/O worker
/// and closes the link.
#[derive(Debug, Clone)]
pub struct Connection {
    channel: CommandChannel,
}

impl Connection {
    /// Take ownership of `link` with default timing. Starts closed.
    pub fn new(link: impl Link + 'static) -> Result<Self> {
        Self::with_config(link, ChannelConfig::default())
    }

    /// Take ownership of `link`. Starts closed.
    pub fn with_config(link: impl Link + 'static, config: ChannelConfig) -> Result<Self> {
        Ok(Self {
            channel: CommandChannel::spawn(Box::new(link), config)?,
        })
    }

    /// Take ownership of `link` and open it.
    pub fn open_with(link: impl Link + 'static, config: ChannelConfig) -> Result<Self> {
        let connection = Self::with_config(link, config)?;
        connection.open()?;
        Ok(connection)
    }

    /// Open the link. Succeeds immediately if already open.
    pub fn open(&self) -> Result<()> {
        let lifecycle = &self.channel.shared.lifecycle;
        let _transition = lifecycle.begin_transition();
        if lifecycle.state() == ConnectionState::Open {
            return Ok(());
        }

        match self.open_link() {
            Ok(()) => {
                lifecycle.set(ConnectionState::Open);
                info!(link = %self.channel.link_name(), "connection opened");
                Ok(())
            }
            Err(err) => {
                // Never opened, so later submits see NotOpen.
                lifecycle.set(ConnectionState::Closed);
                Err(err)
            }
        }
    }

    /// Close the link.
    ///
    /// Queued requests fail with `Disconnected`; a request in flight runs to
    /// the end of its cycle and is then reported as `Disconnected`.
    pub fn close(&self) -> Result<()> {
        let lifecycle = &self.channel.shared.lifecycle;
        let _transition = lifecycle.begin_transition();
        lifecycle.set(ConnectionState::Closed);
        self.close_link()?;
        info!(link = %self.channel.link_name(), "connection closed");
        Ok(())
    }

    /// Close, wait `pause`, then reopen.
    ///
    /// Requests submitted meanwhile fail with `Disconnected`. If the reopen
    /// fails the connection ends up closed and the error is returned.
    pub fn stop_and_start(&self, pause: Duration) -> Result<()> {
        let lifecycle = &self.channel.shared.lifecycle;
        let _transition = lifecycle.begin_transition();
        lifecycle.set(ConnectionState::Reconnecting);
        info!(
            link = %self.channel.link_name(),
            pause_ms = pause.as_millis() as u64,
            "restarting connection"
        );

        if let Err(err) = self.close_link() {
            lifecycle.set_failed(err.to_string());
            return Err(err);
        }
        std::thread::sleep(pause);

        match self.open_link() {
            Ok(()) => {
                lifecycle.set(ConnectionState::Open);
                info!(link = %self.channel.link_name(), "connection reopened");
                Ok(())
            }
            Err(err) => {
                lifecycle.set_failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Why the link was dropped, if the last close was caused by a failure.
    pub fn fault(&self) -> Option<String> {
        self.channel.shared.lifecycle.fault()
    }

    /// A handle for submitting commands from other threads.
    pub fn channel(&self) -> CommandChannel {
        self.channel.clone()
    }

    /// Send `command` and wait for its reply. See [`CommandChannel::submit`].
    pub fn submit(&self, command: Command) -> Result<Option<Reply>> {
        self.channel.submit(command)
    }

    #[cfg(feature = "async")]
    pub async fn submit_async(&self, command: Command) -> Result<Option<Reply>> {
        self.channel.submit_async(command).await
    }

    fn open_link(&self) -> Result<()> {
        let (ack, done) = mpsc::sync_channel(1);
        self.send_job(Job::Open(ack))?;
        match done.recv_timeout(self.transition_bound()) {
            Ok(result) => result.map_err(ChannelError::from),
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::Transition(format!(
                "{} did not open within {:?}",
                self.channel.link_name(),
                self.transition_bound()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::worker_stopped()),
        }
    }

    fn close_link(&self) -> Result<()> {
        let (ack, done) = mpsc::sync_channel(1);
        self.send_job(Job::Close(ack))?;
        match done.recv_timeout(self.transition_bound()) {
            Ok(()) => {
                debug!(link = %self.channel.link_name(), "link closed by worker");
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::Transition(format!(
                "{} did not close within {:?}",
                self.channel.link_name(),
                self.transition_bound()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::worker_stopped()),
        }
    }

    /// The worker may finish an in-flight cycle before acting on a job.
    fn transition_bound(&self) -> Duration {
        let config = self.channel.config();
        config.transition_timeout + config.cycle_bound()
    }

    fn send_job(&self, job: Job) -> Result<()> {
        self.channel
            .shared
            .jobs
            .send(job)
            .map_err(|_| ChannelError::worker_stopped())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use finchlink_frame::commands;
    use finchlink_transport::{LinkError, SimResponse, SimulatedLink};

    use super::*;

    fn config() -> ChannelConfig {
        ChannelConfig {
            read_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_millis(50),
            queue_timeout: Duration::from_secs(2),
            transition_timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn unopened_connection_rejects_without_io() {
        let link = SimulatedLink::finch();
        let sim = link.handle();
        let connection = Connection::with_config(link, config()).expect("worker should start");

        assert_eq!(connection.state(), ConnectionState::Closed);
        let err = connection
            .submit(commands::halt())
            .expect_err("closed connection should reject");
        assert!(matches!(err, ChannelError::NotOpen));
        assert_eq!(sim.opens(), 0);
        assert!(sim.written().is_empty());
    }

    #[test]
    fn open_is_idempotent() {
        let link = SimulatedLink::finch();
        let sim = link.handle();
        let connection = Connection::open_with(link, config()).expect("link should open");

        connection.open().expect("second open should succeed");
        assert_eq!(connection.state(), ConnectionState::Open);
        assert_eq!(sim.opens(), 1);
    }

    #[test]
    fn close_then_submit_is_not_open() {
        let link = SimulatedLink::finch();
        let sim = link.handle();
        let connection = Connection::open_with(link, config()).expect("link should open");

        connection.close().expect("close should succeed");
        assert_eq!(sim.closes(), 1);

        let err = connection
            .submit(commands::light())
            .expect_err("closed connection should reject");
        assert!(matches!(err, ChannelError::NotOpen));
        assert!(sim.written().is_empty());
    }

    #[test]
    fn close_during_cycle_reports_disconnect() {
        let link = SimulatedLink::with_responder(|_, _| {
            SimResponse::Delayed(Duration::from_millis(150), vec![0])
        });
        let connection = Connection::open_with(link, config()).expect("link should open");

        let channel = connection.channel();
        let caller = thread::spawn(move || channel.submit(commands::temperature()));
        thread::sleep(Duration::from_millis(30));

        connection.close().expect("close should succeed");
        let err = caller
            .join()
            .expect("caller thread should complete")
            .expect_err("cycle was interrupted by close");
        assert!(matches!(err, ChannelError::Disconnected(_)));
    }

    #[test]
    fn stop_and_start_rejects_during_pause() {
        let link = SimulatedLink::finch();
        let sim = link.handle();
        let connection = Connection::open_with(link, config()).expect("link should open");

        let restarting = connection.clone();
        let restart =
            thread::spawn(move || restarting.stop_and_start(Duration::from_millis(200)));
        thread::sleep(Duration::from_millis(50));

        assert_eq!(connection.state(), ConnectionState::Reconnecting);
        let err = connection
            .submit(commands::light())
            .expect_err("reconnecting connection should reject");
        assert!(matches!(err, ChannelError::Disconnected(_)));

        restart
            .join()
            .expect("restart thread should complete")
            .expect("restart should succeed");
        assert_eq!(connection.state(), ConnectionState::Open);
        assert!(connection
            .submit(commands::light())
            .expect("query should succeed after restart")
            .is_some());
        assert_eq!(sim.opens(), 2);
        assert_eq!(sim.closes(), 1);
    }

    #[test]
    fn failed_open_leaves_connection_closed() {
        let link = SimulatedLink::finch().named("ttyFAKE");
        let sim = link.handle();
        sim.fail_next_open(std::io::ErrorKind::NotFound);
        let connection = Connection::with_config(link, config()).expect("worker should start");

        let err = connection.open().expect_err("open should fail");
        assert!(matches!(err, ChannelError::Link(LinkError::Open { .. })));
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(matches!(
            connection.submit(commands::light()),
            Err(ChannelError::NotOpen)
        ));

        connection.open().expect("retry should succeed");
        assert_eq!(connection.state(), ConnectionState::Open);
    }

    #[test]
    fn reopen_after_link_failure() {
        let mut failed = false;
        let link = SimulatedLink::with_responder(move |_, _| {
            if failed {
                SimResponse::Reply(vec![127])
            } else {
                failed = true;
                SimResponse::Fail(std::io::ErrorKind::BrokenPipe)
            }
        });
        let sim = link.handle();
        let connection = Connection::open_with(link, config()).expect("link should open");

        assert!(connection.submit(commands::temperature()).is_err());
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(connection.fault().is_some());

        connection.open().expect("reopen should succeed");
        assert!(connection.fault().is_none());
        let reply = connection
            .submit(commands::temperature())
            .expect("query should succeed")
            .expect("temperature query has a reply");
        assert_eq!(reply.bytes(), &[127]);
        assert_eq!(sim.opens(), 2);
    }

    #[test]
    fn dropping_last_handle_closes_link() {
        let link = SimulatedLink::finch();
        let sim = link.handle();
        let connection = Connection::open_with(link, config()).expect("link should open");
        let channel = connection.channel();

        drop(connection);
        assert_eq!(sim.closes(), 0);
        drop(channel);
        assert_eq!(sim.closes(), 1);
    }
}
