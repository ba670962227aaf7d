//! UseCase errors

use thiserror::Error;

use crate::domain::{AuthFailReason, SessionError, StorageError, ValueObjectError};

/// サインアップのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] ValueObjectError),

    #[error("username '{0}' already exists")]
    NameTaken(String),

    #[error("credential backend failure: {0}")]
    Backend(String),
}

impl SignupError {
    pub fn reason(&self) -> AuthFailReason {
        match self {
            SignupError::InvalidUsername(_) => AuthFailReason::InvalidUsername,
            SignupError::NameTaken(_) => AuthFailReason::NameTaken,
            SignupError::Backend(_) => AuthFailReason::Internal,
        }
    }

    /// クライアントに返すメッセージ
    pub fn client_message(&self) -> String {
        match self {
            SignupError::InvalidUsername(e) => format!("Invalid username: {}.", e),
            SignupError::NameTaken(_) => "Username already exists.".to_string(),
            SignupError::Backend(_) => "Signup is temporarily unavailable.".to_string(),
        }
    }
}

/// ログインのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// ユーザーが存在しない・パスワードが違う・ユーザー名の形式が不正
    #[error("invalid username or password")]
    BadCredentials,

    #[error("credential backend failure: {0}")]
    Backend(String),

    /// 検証中に接続が閉じられた
    #[error("connection closed before the session was opened")]
    ConnectionClosed,
}

impl LoginError {
    pub fn reason(&self) -> AuthFailReason {
        match self {
            LoginError::BadCredentials | LoginError::ConnectionClosed => {
                AuthFailReason::BadCredentials
            }
            LoginError::Backend(_) => AuthFailReason::Internal,
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            LoginError::BadCredentials | LoginError::ConnectionClosed => {
                "Invalid username or password.".to_string()
            }
            LoginError::Backend(_) => "Login is temporarily unavailable.".to_string(),
        }
    }
}

/// 認証が必要な操作（EDIT / SAVE / NEW_FILE / CHAT）のエラー
#[derive(Debug, Error)]
pub enum ProtectedError {
    /// トークンが無い・解決できない・他の接続のもの（接続は切断される）
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] SessionError),

    /// 永続化に失敗した（メモリ上のドキュメントは変更されない）
    #[error("{0}")]
    Storage(#[from] StorageError),
}
