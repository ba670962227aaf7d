//! UseCase: ドキュメントの取得

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Document, MessagePushError, ServerEvent, WorkspaceRepository,
};

pub struct GetDocumentUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl GetDocumentUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    /// HELLO: 現在の本文を要求元の接続に `DocState` として送る
    ///
    /// スナップショットの取得と送信を同じロックの内側で行うため、
    /// 以降の `EditUpdate` が `DocState` より先に届くことはない。
    pub async fn execute(&self, connection: &ConnectionId) -> Result<(), MessagePushError> {
        let mut workspace = self.repository.lock().await;
        let content = workspace.document().content().to_string();
        workspace
            .members_mut()
            .push_to(connection, ServerEvent::DocState { content })
    }

    /// 現在のドキュメントのスナップショット
    pub async fn snapshot(&self) -> Document {
        self.repository.document().await
    }
}
