//! Driver configuration.

use std::time::Duration;

use crate::protocol::DEFAULT_MAX_BUFFERED;
use crate::transport::{GatewayOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DEVICE_TYPE, DEFAULT_PORT};

/// Default timeout for a single socket read. Silence longer than this is
/// treated as a lost connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for writing one command block.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// Default pause between the two blocks of a write sequence.
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_secs(1);

/// Default size of one socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default capacity of the request channel into the connection task.
pub const DEFAULT_REQUEST_CAPACITY: usize = 32;

/// Configuration for a [`Driver`](crate::Driver).
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Gateway host name or address.
    pub host: String,
    /// Gateway TCP port.
    pub port: u16,
    /// Device type token sent during registration.
    pub device_type: String,
    /// Timeout for connect and each handshake step.
    pub connect_timeout: Duration,
    /// Timeout for a single socket read.
    pub read_timeout: Duration,
    /// Timeout for writing one command block.
    pub write_timeout: Duration,
    /// Pause between reconnect attempts.
    pub reconnect_interval: Duration,
    /// Pause between the two blocks of a write sequence.
    pub write_delay: Duration,
    /// Maximum bytes per socket read.
    pub read_chunk_size: usize,
    /// Bytes buffered without any frame signature before the buffer is reset.
    pub max_buffered: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Capacity of the request channel.
    pub request_capacity: usize,
}

impl DriverConfig {
    /// Configuration for `host:port` with all other settings at their defaults.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Connection settings for the transport layer.
    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            host: self.host.clone(),
            port: self.port,
            device_type: self.device_type.clone(),
            connect_timeout: self.connect_timeout,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            write_delay: DEFAULT_WRITE_DELAY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_buffered: DEFAULT_MAX_BUFFERED,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}
