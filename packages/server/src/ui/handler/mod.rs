//! Connection and HTTP handlers.

pub mod connection;
pub mod http;
