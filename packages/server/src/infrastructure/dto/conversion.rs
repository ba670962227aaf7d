//! Conversion logic between domain events and wire DTOs.

use crate::domain::{AuthFailReason, ServerEvent};
use crate::infrastructure::dto::wire::{AuthFailCode, ServerMessage};

// ========================================
// Domain → DTO
// ========================================

impl From<AuthFailReason> for AuthFailCode {
    fn from(reason: AuthFailReason) -> Self {
        match reason {
            AuthFailReason::NameTaken => AuthFailCode::NameTaken,
            AuthFailReason::InvalidUsername => AuthFailCode::InvalidUsername,
            AuthFailReason::BadCredentials => AuthFailCode::BadCredentials,
            AuthFailReason::AlreadyAuthenticated => AuthFailCode::AlreadyAuthenticated,
            AuthFailReason::InvalidSession => AuthFailCode::InvalidSession,
            AuthFailReason::Internal => AuthFailCode::Internal,
        }
    }
}

impl From<&ServerEvent> for ServerMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::DocState { content } => ServerMessage::DocState {
                content: content.clone(),
            },
            ServerEvent::EditUpdate { content } => ServerMessage::EditUpdate {
                content: content.clone(),
            },
            ServerEvent::SignedUp { message } => ServerMessage::AuthSuccess {
                token: None,
                user: None,
                message: Some(message.clone()),
            },
            ServerEvent::LoggedIn { token, user } => ServerMessage::AuthSuccess {
                token: Some(token.as_str().to_string()),
                user: Some(user.as_str().to_string()),
                message: None,
            },
            ServerEvent::AuthFail { reason, message } => ServerMessage::AuthFail {
                reason: (*reason).into(),
                message: message.clone(),
            },
            ServerEvent::Notification { message } => ServerMessage::Notification {
                message: message.clone(),
            },
            ServerEvent::Chat { user, text } => ServerMessage::ChatMessage {
                user: user.as_str().to_string(),
                text: text.clone(),
            },
        }
    }
}
