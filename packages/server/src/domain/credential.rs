//! 資格情報ストアのインターフェース
//!
//! アカウント作成と資格情報の検証だけを提供します。保存方式やハッシュ方式は実装側の責務です。

use async_trait::async_trait;

use super::{
    error::CredentialError,
    value_object::{UserId, Username},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// アカウントを作成する。ユーザー名が既に存在すれば `CredentialError::AlreadyExists`
    async fn create_account(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserId, CredentialError>;

    /// 資格情報を検証する。一致しなければ `Ok(None)`
    async fn verify_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<Option<UserId>, CredentialError>;
}
