//! Domain errors

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("username must be at most {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    #[error("username must not contain whitespace or control characters")]
    InvalidUsernameCharacter,

    #[error("session token must be {expected} lowercase hex characters")]
    MalformedSessionToken { expected: usize },
}

/// セッション検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session token is missing")]
    MissingToken,

    #[error("session token is invalid or expired")]
    InvalidSession,
}

/// 資格情報ストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("username '{0}' already exists")]
    AlreadyExists(String),

    #[error("credential backend failure: {0}")]
    Backend(String),
}

/// ドキュメント永続化のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("document storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// 接続ごとの outbox への送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not a member")]
    ClientNotFound(String),

    #[error("outbox of connection '{0}' is full")]
    Overflow(String),

    #[error("outbox of connection '{0}' is closed")]
    Closed(String),
}
