//! UseCase: サインアップ
//!
//! ユーザー名を検証し、資格情報ストアにアカウントを作成する。
//! 成功しても接続は未認証のまま（続けて LOGIN が必要）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, CredentialError, CredentialStore, ServerEvent, UserId, Username,
    WorkspaceRepository,
};

use super::error::SignupError;

pub const SIGNUP_SUCCESS_MESSAGE: &str = "Signup successful! Please log in.";

pub struct SignupUseCase {
    repository: Arc<dyn WorkspaceRepository>,
    credentials: Arc<dyn CredentialStore>,
}

impl SignupUseCase {
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            repository,
            credentials,
        }
    }

    /// アカウントを作成し、成功したら要求元に `SignedUp` を送る
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        username: String,
        password: &str,
    ) -> Result<UserId, SignupError> {
        let username = Username::new(username)?;

        let user_id = self
            .credentials
            .create_account(&username, password)
            .await
            .map_err(|e| match e {
                CredentialError::AlreadyExists(name) => SignupError::NameTaken(name),
                CredentialError::Backend(message) => SignupError::Backend(message),
            })?;
        tracing::info!("User '{}' signed up", username);

        if let Err(e) = self
            .repository
            .push_to(
                connection,
                ServerEvent::SignedUp {
                    message: SIGNUP_SUCCESS_MESSAGE.to_string(),
                },
            )
            .await
        {
            tracing::debug!("Signup reply not delivered: {}", e);
        }

        Ok(user_id)
    }
}
