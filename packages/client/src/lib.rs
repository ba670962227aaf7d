//! Terminal client for the collaborative notepad.

pub mod command;
pub mod domain;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
