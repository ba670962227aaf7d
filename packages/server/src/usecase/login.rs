//! UseCase: ログイン
//!
//! 資格情報の検証はロックの外で行い、成功した場合のみロックを取って
//! セッションを発行する。失敗時にセッション表が変更されることはない。

use std::sync::Arc;

use kakiba_shared::time::Clock;

use crate::domain::{
    ConnectionId, CredentialError, CredentialStore, ServerEvent, Session, Timestamp, Username,
    WorkspaceRepository,
};

use super::error::LoginError;

pub struct LoginUseCase {
    repository: Arc<dyn WorkspaceRepository>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl LoginUseCase {
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            credentials,
            clock,
        }
    }

    /// 資格情報を検証してセッションを発行し、要求元に `LoggedIn` を送る
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        username: String,
        password: &str,
    ) -> Result<Session, LoginError> {
        // 形式が不正なユーザー名は存在しないユーザーと同じ扱い
        let username = Username::new(username).map_err(|_| LoginError::BadCredentials)?;

        let verified = self
            .credentials
            .verify_credentials(&username, password)
            .await
            .map_err(|e| match e {
                CredentialError::AlreadyExists(name) => {
                    LoginError::Backend(format!("unexpected duplicate '{}'", name))
                }
                CredentialError::Backend(message) => LoginError::Backend(message),
            })?;
        if verified.is_none() {
            tracing::warn!("Login rejected for '{}'", username);
            return Err(LoginError::BadCredentials);
        }

        let mut workspace = self.repository.lock().await;
        if !workspace.members().contains(connection) {
            return Err(LoginError::ConnectionClosed);
        }

        let now = Timestamp::new(self.clock.now_jst_millis());
        let session = workspace
            .sessions_mut()
            .open(username.clone(), *connection, now);
        tracing::info!("User '{}' logged in on connection '{}'", username, connection);

        if let Err(e) = workspace.members_mut().push_to(
            connection,
            ServerEvent::LoggedIn {
                token: session.token.clone(),
                user: username,
            },
        ) {
            // 届けられない場合はセッションを残さない
            workspace.sessions_mut().revoke(&session.token);
            tracing::warn!("Login reply not delivered: {}", e);
            return Err(LoginError::ConnectionClosed);
        }

        Ok(session)
    }
}
