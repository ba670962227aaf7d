//! Error types for the terminal client.

use kakiba_server::infrastructure::codec::FrameError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not connect, or the connection broke
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The server sent something that is not a valid frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] FrameError),

    /// The server closed the connection
    #[error("Server closed the connection")]
    Disconnected,
}
