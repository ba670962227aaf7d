//! Collaborative editor server: TCP listener, per-connection actors and the admin HTTP surface.

pub mod config;
mod handler;
mod server;
mod signal;
pub mod state;

pub use config::ServerConfig;
pub use handler::http::router;
pub use server::{Server, ServerError};
pub use signal::shutdown_signal;
