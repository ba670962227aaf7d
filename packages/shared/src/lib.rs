//! Utilities shared by the Kakiba server and client binaries.

pub mod logger;
pub mod time;
