//! UseCase: チャットの送信
//!
//! 送信者を含む全接続に `Chat` を送る。

use std::sync::Arc;

use crate::domain::{BroadcastReport, ConnectionId, ServerEvent, WorkspaceRepository};

use super::error::ProtectedError;

pub struct SendChatUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl SendChatUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        connection: &ConnectionId,
        token: Option<&str>,
        text: String,
    ) -> Result<BroadcastReport, ProtectedError> {
        let mut workspace = self.repository.lock().await;
        let session = workspace.authorize(connection, token)?;
        tracing::debug!("Chat from '{}': {}", session.user, text);

        Ok(workspace.members_mut().broadcast(
            ServerEvent::Chat {
                user: session.user,
                text,
            },
            None,
        ))
    }
}
