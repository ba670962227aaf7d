//! Data Transfer Objects (DTOs) for the notepad protocol.
//!
//! DTOs are organized by protocol:
//! - `wire`: framed TCP protocol messages
//! - `http`: admin HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod wire;
