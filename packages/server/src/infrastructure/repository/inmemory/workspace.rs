//! InMemory Workspace Repository 実装
//!
//! ドメイン層が定義する WorkspaceRepository trait の具体的な実装。
//! `Workspace` 集約を 1 つの `tokio::sync::Mutex` で保護します。
//!
//! ドキュメント・セッション表・接続集合は全てこの 1 つのロックの内側にあるため、
//! 「セッションの追加」と「接続集合の更新」のような複数リソースにまたがる操作も、
//! 他の接続からは常に原子的に観測されます。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Workspace, WorkspaceGuard, WorkspaceRepository};

/// インメモリ Workspace Repository 実装
pub struct InMemoryWorkspaceRepository {
    workspace: Arc<Mutex<Workspace>>,
}

impl InMemoryWorkspaceRepository {
    /// 新しい InMemoryWorkspaceRepository を作成
    pub fn new(workspace: Arc<Mutex<Workspace>>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn lock(&self) -> WorkspaceGuard<'_> {
        self.workspace.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Document, ServerEvent, Timestamp, Username};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - trait の既定メソッド（document, push_to, count_connections）がロック越しに動くこと
    // - 複数タスクから同時に更新しても状態が壊れないこと
    // ========================================

    fn create_test_repository() -> Arc<InMemoryWorkspaceRepository> {
        let workspace = Workspace::new(Document::new(
            "Welcome".to_string(),
            Timestamp::new(1000),
        ));
        Arc::new(InMemoryWorkspaceRepository::new(Arc::new(Mutex::new(
            workspace,
        ))))
    }

    #[tokio::test]
    async fn test_document_returns_snapshot() {
        // テスト項目: document() が現在のドキュメントのコピーを返す
        // given (前提条件):
        let repo = create_test_repository();
        repo.lock()
            .await
            .replace_document("updated".to_string(), Timestamp::new(2000));

        // when (操作):
        let document = repo.document().await;

        // then (期待する結果):
        assert_eq!(document.content(), "updated");
        assert_eq!(document.updated_at(), Timestamp::new(2000));
    }

    #[tokio::test]
    async fn test_push_to_delivers_to_outbox() {
        // テスト項目: push_to で接続の outbox にイベントが積まれる
        // given (前提条件):
        let repo = create_test_repository();
        let (tx, mut rx) = mpsc::channel(8);
        let connection = ConnectionId::generate();
        repo.lock().await.members_mut().join(connection, tx);

        // when (操作):
        let result = repo
            .push_to(&connection, ServerEvent::notification("hello"))
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(*rx.recv().await.unwrap(), ServerEvent::notification("hello"));
    }

    #[tokio::test]
    async fn test_concurrent_joins_and_logins_are_consistent() {
        // テスト項目: 多数のタスクが同時に参加・ログインしても、接続数とセッション数が一致する
        // given (前提条件):
        let repo = create_test_repository();
        let mut receivers = Vec::new();
        let mut handles = Vec::new();

        // when (操作):
        for i in 0..50 {
            let (tx, rx) = mpsc::channel(8);
            receivers.push(rx);
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let connection = ConnectionId::generate();
                let mut workspace = repo.lock().await;
                workspace.members_mut().join(connection, tx);
                workspace.sessions_mut().open(
                    Username::new(format!("user{}", i)).unwrap(),
                    connection,
                    Timestamp::new(1000),
                );
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(repo.count_connections().await, 50);
        assert_eq!(repo.lock().await.sessions().len(), 50);
    }
}
