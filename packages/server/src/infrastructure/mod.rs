//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、ワイヤーフォーマット（フレーミングと DTO）を提供します。

pub mod codec;
pub mod credential;
pub mod dto;
pub mod repository;
pub mod storage;
