//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Current shared document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDto {
    pub content: String,
    /// Length of `content` in characters
    pub length: usize,
    /// RFC 3339 (JST)
    pub updated_at: String,
}

/// Server status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    pub connections: usize,
    pub sessions: usize,
    pub authenticated_users: Vec<String>,
}
