//! UseCase: 新しいドキュメントの作成
//!
//! 本文を定型文で置き換えて永続化し、全接続に `DocState` と通知を送る。
//! 永続化に失敗した場合はメモリ上の本文も置き換えない。

use std::sync::Arc;

use kakiba_shared::time::{Clock, timestamp_to_jst_clock_time};

use crate::domain::{
    BroadcastReport, ConnectionId, DocumentStorage, ServerEvent, Timestamp, Username,
    WorkspaceRepository,
};

use super::error::ProtectedError;

pub struct NewFileUseCase {
    repository: Arc<dyn WorkspaceRepository>,
    storage: Arc<dyn DocumentStorage>,
    clock: Arc<dyn Clock>,
}

/// 新しいドキュメントの本文
pub fn new_file_content(user: &Username, now: Timestamp) -> String {
    format!(
        "New document started by {} at {}.",
        user,
        timestamp_to_jst_clock_time(now.value())
    )
}

impl NewFileUseCase {
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        storage: Arc<dyn DocumentStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            storage,
            clock,
        }
    }

    pub async fn execute(
        &self,
        connection: &ConnectionId,
        token: Option<&str>,
    ) -> Result<BroadcastReport, ProtectedError> {
        let mut workspace = self.repository.lock().await;
        let session = workspace.authorize(connection, token)?;

        let now = Timestamp::new(self.clock.now_jst_millis());
        let content = new_file_content(&session.user, now);
        self.storage.save(&content).await?;
        workspace.replace_document(content.clone(), now);
        tracing::info!("New document started by '{}'", session.user);

        let members = workspace.members_mut();
        let mut report = members.broadcast(ServerEvent::DocState { content }, None);
        let notified = members.broadcast(
            ServerEvent::notification(format!("{} created a new file.", session.user)),
            None,
        );
        report.delivered = notified.delivered;
        report.evicted.extend(notified.evicted);
        Ok(report)
    }
}
