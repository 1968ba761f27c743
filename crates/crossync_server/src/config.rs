//! Server configuration.

use crossync_core::CoordinatorConfig;
use crossync_protocol::MAX_FRAME_SIZE;
use std::net::SocketAddr;
use std::time::Duration;

/// Port used when no bind address is given.
pub const DEFAULT_PORT: u16 = 25580;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Maximum request frame body size, in bytes.
    pub max_frame_size: usize,
    /// Configuration of the coordinator created at service start.
    pub coordinator: CoordinatorConfig,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_connections: 256,
            request_timeout: Duration::from_secs(30),
            max_frame_size: MAX_FRAME_SIZE,
            coordinator: CoordinatorConfig::default(),
        }
    }

    /// Sets the maximum concurrent connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum frame size. Values above [`MAX_FRAME_SIZE`] are clamped.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size.min(MAX_FRAME_SIZE);
        self
    }

    /// Sets the coordinator configuration.
    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
    }
}
