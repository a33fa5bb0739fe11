//! Configuration for the multiplexed connection

use std::time::Duration;

/// Configuration for a [`Connection`](crate::Connection)
///
/// All values have sensible defaults; use the `with_*` builders to override
/// individual fields:
///
/// ```
/// use redis_mux::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::default()
///     .with_host("redis.internal")
///     .with_port("6380")
///     .with_ping_interval(Duration::from_millis(500))
///     .with_reconnect(true);
/// assert_eq!(config.host, "redis.internal");
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address
    pub host: String,

    /// Server port
    pub port: String,

    /// Username if authentication is required
    pub username: Option<String>,

    /// Password if authentication is required
    pub password: Option<String>,

    /// Timeout of the resolve step
    pub resolve_timeout: Duration,

    /// Timeout of the connect step
    pub connect_timeout: Duration,

    /// Interval between health-check pings. No inbound data for twice this
    /// interval aborts the run with an idle timeout.
    pub ping_interval: Duration,

    /// Time waited before a reconnect attempt (see `enable_reconnect`)
    pub reconnect_interval: Duration,

    /// Upper bound on the read buffer, in bytes
    pub max_read_size: usize,

    /// Whether queued requests may be batched into a single socket write
    pub coalesce_requests: bool,

    /// Enable lifecycle events, see [`Connection::receive_event`](crate::Connection::receive_event)
    pub enable_events: bool,

    /// Enable automatic reconnection (see also `reconnect_interval`)
    pub enable_reconnect: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "6379".to_string(),
            username: None,
            password: None,
            resolve_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(1),
            max_read_size: usize::MAX,
            coalesce_requests: true,
            enable_events: false,
            enable_reconnect: false,
        }
    }
}

impl ConnectionConfig {
    /// Set the server address
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Set the credentials sent with the `HELLO` handshake
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the resolve timeout
    #[must_use]
    pub const fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the ping interval
    #[must_use]
    pub const fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set the pause between reconnect attempts
    #[must_use]
    pub const fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set the read buffer limit
    #[must_use]
    pub const fn with_max_read_size(mut self, bytes: usize) -> Self {
        self.max_read_size = bytes;
        self
    }

    /// Allow or forbid batching queued requests into one write
    #[must_use]
    pub const fn with_coalesce_requests(mut self, coalesce: bool) -> Self {
        self.coalesce_requests = coalesce;
        self
    }

    /// Enable or disable lifecycle events
    #[must_use]
    pub const fn with_events(mut self, enable: bool) -> Self {
        self.enable_events = enable;
        self
    }

    /// Enable or disable automatic reconnection
    #[must_use]
    pub const fn with_reconnect(mut self, enable: bool) -> Self {
        self.enable_reconnect = enable;
        self
    }
}
