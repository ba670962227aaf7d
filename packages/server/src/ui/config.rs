//! Server runtime configuration.

use crate::infrastructure::codec::DEFAULT_MAX_FRAME_LENGTH;

/// Default capacity of a connection's outbox
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the editor protocol and the admin HTTP surface bind to
    pub host: String,
    /// Editor protocol port
    pub port: u16,
    /// Admin HTTP port (`None` disables it)
    pub http_port: Option<u16>,
    /// Maximum payload length of a single frame
    pub max_frame_length: usize,
    /// Events a connection may have queued before it is dropped
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            http_port: Some(8081),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_bind_addr(&self) -> Option<String> {
        self.http_port.map(|port| format!("{}:{}", self.host, port))
    }
}
