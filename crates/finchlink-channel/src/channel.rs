use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use finchlink_frame::{Command, Reply};
use finchlink_transport::Link;
use tracing::debug;

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::lifecycle::{ConnectionState, Lifecycle};
use crate::pending::PendingRequest;
use crate::worker::{self, Job};

/// State shared by every handle to one link.
pub(crate) struct Shared {
    pub(crate) jobs: Sender<Job>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) config: ChannelConfig,
    pub(crate) link_name: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let _ = self.jobs.send(Job::Shutdown);
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                debug!(link = %self.link_name, "I/O worker panicked");
            }
        }
    }
}

/// Serialized request/response access to one link.
///
/// Cheap to clone; every clone feeds the same FIFO queue and the same I/O
/// worker. `submit` may be called from any number of threads at once. Each
/// caller gets exactly the reply to its own command.
#[derive(Clone)]
pub struct CommandChannel {
    pub(crate) shared: Arc<Shared>,
}

impl CommandChannel {
    /// Start an I/O worker for `link`. The connection begins closed.
    pub(crate) fn spawn(link: Box<dyn Link>, config: ChannelConfig) -> Result<Self> {
        let link_name = link.describe();
        let lifecycle = Arc::new(Lifecycle::new());
        let (jobs, rx) = mpsc::channel();
        let handle = worker::spawn(link, Arc::clone(&lifecycle), config.clone(), rx)?;

        Ok(Self {
            shared: Arc::new(Shared {
                jobs,
                lifecycle,
                config,
                link_name,
                worker: Mutex::new(Some(handle)),
            }),
        })
    }

    /// Send `command` and wait for its reply.
    ///
    /// Returns `Ok(None)` as soon as a command without a reply has been
    /// written. Fails fast with `NotOpen` or `Disconnected` if the
    /// connection is not open, without touching the link.
    pub fn submit(&self, command: Command) -> Result<Option<Reply>> {
        self.shared.lifecycle.admit()?;

        let (request, waiter) = PendingRequest::new(command);
        self.shared
            .jobs
            .send(Job::Submit(request))
            .map_err(|_| ChannelError::worker_stopped())?;

        let config = &self.shared.config;
        waiter.wait(config.queue_timeout, config.cycle_bound())
    }

    /// Async form of [`submit`](Self::submit).
    ///
    /// The wait runs on tokio's blocking pool, so the runtime thread is free
    /// while the command is queued or in flight.
    #[cfg(feature = "async")]
    pub async fn submit_async(&self, command: Command) -> Result<Option<Reply>> {
        let channel = self.clone();
        tokio::task::spawn_blocking(move || channel.submit(command))
            .await
            .map_err(|err| ChannelError::Disconnected(format!("submit task failed: {err}")))?
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.lifecycle.state()
    }

    /// The channel's timing configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    /// Diagnostic name of the underlying link.
    pub fn link_name(&self) -> &str {
        &self.shared.link_name
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("link", &self.shared.link_name)
            .field("state", &self.state())
            .finish()
    }
}
