//! UseCase: 接続の登録

use std::sync::Arc;

use crate::domain::{ConnectionId, PusherChannel, WorkspaceRepository};

/// 接続をブロードキャスト対象に加えるユースケース
pub struct ConnectClientUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl ConnectClientUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    /// 接続の outbox を登録する。同じ接続 ID が登録済みなら `false`
    pub async fn execute(&self, connection: ConnectionId, channel: PusherChannel) -> bool {
        let mut workspace = self.repository.lock().await;
        let joined = workspace.members_mut().join(connection, channel);
        if joined {
            tracing::info!(
                "Connection '{}' joined ({} connected)",
                connection,
                workspace.members().len()
            );
        } else {
            tracing::warn!("Connection '{}' is already registered", connection);
        }
        joined
    }
}
