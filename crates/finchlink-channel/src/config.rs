use std::time::Duration;

use finchlink_transport::DEFAULT_READ_TIMEOUT;

/// Extra allowance on top of link timeouts before a caller gives up on an
/// in-flight cycle.
const CYCLE_MARGIN: Duration = Duration::from_millis(100);

/// Timing configuration for a command channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How long the worker waits for a reply. Default: 500 ms.
    pub read_timeout: Duration,
    /// Upper bound the link applies to a single frame write. Default: 500 ms.
    pub write_timeout: Duration,
    /// How long a caller waits for its turn plus its own cycle. Default: 5 s.
    pub queue_timeout: Duration,
    /// How long `open`/`close` wait for the worker to act. Default: 2 s.
    pub transition_timeout: Duration,
}

impl ChannelConfig {
    /// Worst-case duration of one write-then-read cycle.
    pub fn cycle_bound(&self) -> Duration {
        self.write_timeout + self.read_timeout + CYCLE_MARGIN
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: Duration::from_millis(500),
            queue_timeout: Duration::from_secs(5),
            transition_timeout: Duration::from_secs(2),
        }
    }
}
