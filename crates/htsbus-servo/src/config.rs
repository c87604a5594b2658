use std::time::Duration;

use htsbus_transport::DEFAULT_TIMEOUT;

/// Default pause between polls of the line while waiting for a reply.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the transaction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// How long to wait for the first reply byte. `None` waits forever.
    /// Default: the serial line timeout (1 s).
    pub response_timeout: Option<Duration>,
    /// Pause between polls of the line while waiting. Default: 1 ms.
    pub poll_interval: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            response_timeout: Some(DEFAULT_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
