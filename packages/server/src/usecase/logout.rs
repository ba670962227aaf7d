//! UseCase: ログアウト
//!
//! 要求元の接続が作成したセッションを破棄する。接続の切断は UI 層が行う。

use std::sync::Arc;

use crate::domain::{ConnectionId, Session, WorkspaceRepository};

pub struct LogoutUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl LogoutUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    /// 破棄したセッションを返す（未ログインなら空）
    pub async fn execute(&self, connection: &ConnectionId) -> Vec<Session> {
        let revoked = self
            .repository
            .lock()
            .await
            .sessions_mut()
            .revoke_connection(connection);
        for session in &revoked {
            tracing::info!("User '{}' logged out", session.user);
        }
        revoked
    }
}
