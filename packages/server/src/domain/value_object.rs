//! 値オブジェクト
//!
//! 生成時に検証を行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use super::error::ValueObjectError;

/// ユーザー名
///
/// 1〜50 文字で、空白文字・制御文字を含まない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let length = value.chars().count();
        if length == 0 {
            return Err(ValueObjectError::EmptyUsername);
        }
        if length > Self::MAX_LENGTH {
            return Err(ValueObjectError::UsernameTooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValueObjectError::InvalidUsernameCharacter);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 資格情報ストアが払い出すユーザー ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// セッショントークン（128 bit の乱数を 16 進 32 文字で表現）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    const BYTES: usize = 16;
    const HEX_LENGTH: usize = Self::BYTES * 2;

    /// OS の乱数源から新しいトークンを生成
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// クライアントから受け取った文字列をトークンとして解釈
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        let well_formed = value.len() == Self::HEX_LENGTH
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !well_formed {
            return Err(ValueObjectError::MalformedSessionToken {
                expected: Self::HEX_LENGTH,
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 接続 ID（accept ごとに払い出す）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// タイムスタンプ（JST, Unix ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
