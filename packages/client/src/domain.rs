//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use kakiba_server::infrastructure::{
    codec::FrameError,
    dto::wire::{ClientMessage, ServerMessage},
};

use crate::{command::Command, error::ClientError};

/// What the session loop should do with a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a message and keep going
    Send(ClientMessage),
    /// Send a message, then end the session without reconnecting
    SendAndClose(ClientMessage),
    /// Print something locally
    Print(String),
    Help,
    Quit,
}

/// The client's local copy of the shared state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalView {
    pub document: String,
    pub token: Option<String>,
    pub user: Option<String>,
}

impl LocalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions do not survive a reconnect
    pub fn reset_session(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Apply a message received from the server
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::DocState { content } | ServerMessage::EditUpdate { content } => {
                self.document = content.clone();
            }
            ServerMessage::AuthSuccess {
                token: Some(token),
                user,
                ..
            } => {
                self.token = Some(token.clone());
                self.user = user.clone();
            }
            _ => {}
        }
    }

    /// Turn a command into an action
    ///
    /// Edits are applied locally right away, since the server does not echo
    /// them back to the sender.
    pub fn prepare(&mut self, command: Command) -> Action {
        match command {
            Command::Signup { user, password } => {
                Action::Send(ClientMessage::Signup { user, password })
            }
            Command::Login { user, password } => {
                if self.token.is_some() {
                    return Action::Print("Already logged in.".to_string());
                }
                Action::Send(ClientMessage::Login { user, password })
            }
            Command::Logout => Action::SendAndClose(ClientMessage::Logout {
                token: self.token.clone(),
            }),
            Command::Show => Action::Print(self.document.clone()),
            Command::Help => Action::Help,
            Command::Quit => Action::Quit,
            protected => {
                let Some(token) = self.token.clone() else {
                    return Action::Print("Please /login first.".to_string());
                };
                self.protected(protected, token)
            }
        }
    }

    fn protected(&mut self, command: Command, token: String) -> Action {
        let token = Some(token);
        match command {
            Command::Edit(content) => {
                self.document = content.clone();
                Action::Send(ClientMessage::Edit { content, token })
            }
            Command::Append(line) => {
                let content = appended(&self.document, &line);
                self.document = content.clone();
                Action::Send(ClientMessage::Edit { content, token })
            }
            Command::Save => Action::Send(ClientMessage::Save { token }),
            Command::New => Action::Send(ClientMessage::NewFile { token }),
            Command::Chat(text) => Action::Send(ClientMessage::Chat { text, token }),
            _ => Action::Help,
        }
    }
}

/// Add `line` as a new line at the end of `document`
pub fn appended(document: &str, line: &str) -> String {
    if document.is_empty() || document.ends_with('\n') {
        format!("{}{}", document, line)
    } else {
        format!("{}\n{}", document, line)
    }
}

/// Check if the client should exit immediately based on the error type.
///
/// A server speaking a different protocol will not get better by reconnecting.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Protocol(FrameError::Malformed(_) | FrameError::TooLarge { .. })
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
