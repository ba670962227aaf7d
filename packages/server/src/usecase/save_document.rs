//! UseCase: ドキュメントの保存
//!
//! 永続化はロックを保持したまま行う。保存中に EDIT が割り込むことはなく、
//! 保存される本文は常に「ある時点で全員が見ていた本文」になる。

use std::sync::Arc;

use crate::domain::{
    BroadcastReport, ConnectionId, DocumentStorage, ServerEvent, StorageError,
    WorkspaceRepository,
};

use super::error::ProtectedError;

pub struct SaveDocumentUseCase {
    repository: Arc<dyn WorkspaceRepository>,
    storage: Arc<dyn DocumentStorage>,
}

impl SaveDocumentUseCase {
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        storage: Arc<dyn DocumentStorage>,
    ) -> Self {
        Self {
            repository,
            storage,
        }
    }

    /// SAVE: 現在の本文を永続化し、全接続に通知する
    ///
    /// 永続化に失敗した場合は `ProtectedError::Storage` を返し、何もブロードキャストしない。
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        token: Option<&str>,
    ) -> Result<BroadcastReport, ProtectedError> {
        let mut workspace = self.repository.lock().await;
        let session = workspace.authorize(connection, token)?;

        self.storage.save(workspace.document().content()).await?;
        tracing::info!("Document saved by '{}'", session.user);

        Ok(workspace.members_mut().broadcast(
            ServerEvent::notification(format!("Document saved by {}.", session.user)),
            None,
        ))
    }

    /// シャットダウン時の最終保存
    pub async fn flush(&self) -> Result<(), StorageError> {
        let workspace = self.repository.lock().await;
        self.storage.save(workspace.document().content()).await
    }
}
