//! Wire protocol message DTOs.
//!
//! Every frame carries one JSON object with a `type` field. Unknown `type`
//! values fail to deserialize and are treated as malformed frames.

use serde::{Deserialize, Serialize};

/// Messages sent from a client to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Handshake; answered with `DOC_STATE`
    Hello,
    Signup {
        #[serde(default)]
        user: String,
        #[serde(default)]
        password: String,
    },
    Login {
        #[serde(default)]
        user: String,
        #[serde(default)]
        password: String,
    },
    Logout {
        #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Edit {
        #[serde(default)]
        content: String,
        #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Save {
        #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    NewFile {
        #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Chat {
        #[serde(default)]
        text: String,
        #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

impl ClientMessage {
    /// Wire name of the message type (for logging)
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Hello => "HELLO",
            ClientMessage::Signup { .. } => "SIGNUP",
            ClientMessage::Login { .. } => "LOGIN",
            ClientMessage::Logout { .. } => "LOGOUT",
            ClientMessage::Edit { .. } => "EDIT",
            ClientMessage::Save { .. } => "SAVE",
            ClientMessage::NewFile { .. } => "NEW_FILE",
            ClientMessage::Chat { .. } => "CHAT",
        }
    }
}

/// Reason codes carried by `AUTH_FAIL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthFailCode {
    NameTaken,
    InvalidUsername,
    BadCredentials,
    AlreadyAuthenticated,
    InvalidSession,
    Internal,
}

/// Messages sent from the server to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    DocState {
        content: String,
    },
    EditUpdate {
        content: String,
    },
    /// Login (`token` + `user`) or signup (`message`) success
    AuthSuccess {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    AuthFail {
        reason: AuthFailCode,
        message: String,
    },
    Notification {
        message: String,
    },
    ChatMessage {
        user: String,
        text: String,
    },
}
