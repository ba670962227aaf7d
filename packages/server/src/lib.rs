//! Kakiba collaborative notepad server library.
//!
//! One authoritative plain-text document is shared by every connected client.
//! Clients speak a length-prefixed JSON protocol over TCP, authenticate with
//! session tokens and receive document edits, notifications and chat messages
//! through per-connection outboxes.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
