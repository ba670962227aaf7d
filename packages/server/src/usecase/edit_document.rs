//! UseCase: ドキュメントの編集
//!
//! 本文を丸ごと置き換え（後勝ち）、要求元以外の全接続に `EditUpdate` を送る。
//! 置き換えとブロードキャストは同じロックの内側で行うため、
//! 全ての接続は置き換えと同じ順序で更新を受け取る。

use std::sync::Arc;

use kakiba_shared::time::Clock;

use crate::domain::{
    BroadcastReport, ConnectionId, ServerEvent, Timestamp, WorkspaceRepository,
};

use super::error::ProtectedError;

pub struct EditDocumentUseCase {
    repository: Arc<dyn WorkspaceRepository>,
    clock: Arc<dyn Clock>,
}

impl EditDocumentUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(
        &self,
        connection: &ConnectionId,
        token: Option<&str>,
        content: String,
    ) -> Result<BroadcastReport, ProtectedError> {
        let mut workspace = self.repository.lock().await;
        let session = workspace.authorize(connection, token)?;

        let now = Timestamp::new(self.clock.now_jst_millis());
        workspace.replace_document(content.clone(), now);
        tracing::debug!(
            "Document replaced by '{}' ({} chars)",
            session.user,
            content.chars().count()
        );

        Ok(workspace
            .members_mut()
            .broadcast(ServerEvent::EditUpdate { content }, Some(connection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, SessionError, Username, Workspace};
    use crate::infrastructure::repository::InMemoryWorkspaceRepository;
    use kakiba_shared::time::FixedClock;
    use tokio::sync::{Mutex, mpsc};

    type Outbox = mpsc::Receiver<Arc<ServerEvent>>;

    fn create_test_repository() -> Arc<InMemoryWorkspaceRepository> {
        let workspace = Workspace::new(Document::new("Welcome".to_string(), Timestamp::new(0)));
        Arc::new(InMemoryWorkspaceRepository::new(Arc::new(Mutex::new(
            workspace,
        ))))
    }

    /// 接続を登録し、`user` が与えられればログインさせる
    async fn connect(
        repository: &InMemoryWorkspaceRepository,
        user: Option<&str>,
    ) -> (ConnectionId, Option<String>, Outbox) {
        let connection = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(16);
        let mut workspace = repository.lock().await;
        workspace.members_mut().join(connection, tx);
        let token = user.map(|name| {
            workspace
                .sessions_mut()
                .open(
                    Username::new(name.to_string()).unwrap(),
                    connection,
                    Timestamp::new(0),
                )
                .token
                .as_str()
                .to_string()
        });
        (connection, token, rx)
    }

    #[tokio::test]
    async fn test_edit_replaces_and_broadcasts_to_others() {
        // テスト項目: 編集で本文が置き換わり、要求元以外の全接続に EditUpdate が届く
        // given (前提条件):
        let repository = create_test_repository();
        let (a, token_a, mut rx_a) = connect(&repository, Some("alice")).await;
        let (_b, _, mut rx_b) = connect(&repository, None).await;
        let (_c, _, mut rx_c) = connect(&repository, Some("carol")).await;
        let usecase = EditDocumentUseCase::new(repository.clone(), Arc::new(FixedClock::new(42)));

        // when (操作):
        let report = usecase
            .execute(&a, token_a.as_deref(), "Hello".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        let document = repository.document().await;
        assert_eq!(document.content(), "Hello");
        assert_eq!(document.updated_at(), Timestamp::new(42));
        let expected = ServerEvent::EditUpdate {
            content: "Hello".to_string(),
        };
        assert_eq!(*rx_b.recv().await.unwrap(), expected);
        assert_eq!(*rx_c.recv().await.unwrap(), expected);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edit_with_unknown_token_changes_nothing() {
        // テスト項目: 不明なトークンでの編集は Unauthorized になり、本文もブロードキャストも変化しない
        // given (前提条件):
        let repository = create_test_repository();
        let (a, _token_a, _rx_a) = connect(&repository, Some("alice")).await;
        let (_b, _, mut rx_b) = connect(&repository, None).await;
        let usecase = EditDocumentUseCase::new(repository.clone(), Arc::new(FixedClock::new(42)));

        // when (操作):
        let result = usecase
            .execute(&a, Some("deadbeefdeadbeefdeadbeefdeadbeef"), "X".to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ProtectedError::Unauthorized(SessionError::InvalidSession))
        ));
        assert_eq!(repository.document().await.content(), "Welcome");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edits_are_observed_in_the_same_order() {
        // テスト項目: 並行した編集でも、全ての受信者が同じ順序で更新を受け取り、最後の更新が本文と一致する
        // given (前提条件):
        let repository = create_test_repository();
        let (a, token_a, mut rx_a) = connect(&repository, Some("alice")).await;
        let (b, token_b, mut rx_b) = connect(&repository, Some("bob")).await;
        let (_c, _, mut rx_c) = connect(&repository, None).await;
        let usecase = Arc::new(EditDocumentUseCase::new(
            repository.clone(),
            Arc::new(FixedClock::new(42)),
        ));

        // when (操作):
        let mut handles = Vec::new();
        for (connection, token, prefix) in [(a, token_a, "a"), (b, token_b, "b")] {
            let usecase = usecase.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    usecase
                        .execute(&connection, token.as_deref(), format!("{}{}", prefix, i))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        let drain = |rx: &mut Outbox| {
            let mut seen = Vec::new();
            while let Ok(event) = rx.try_recv() {
                if let ServerEvent::EditUpdate { content } = &*event {
                    seen.push(content.clone());
                }
            }
            seen
        };
        let seen_a = drain(&mut rx_a);
        let seen_b = drain(&mut rx_b);
        let seen_c = drain(&mut rx_c);
        assert_eq!(seen_c.len(), 10);
        // A と B は自分の編集を受け取らないが、他者の編集の相対順序は C と一致する
        let from_b: Vec<String> = seen_c.iter().filter(|c| c.starts_with('b')).cloned().collect();
        let from_a: Vec<String> = seen_c.iter().filter(|c| c.starts_with('a')).cloned().collect();
        assert_eq!(seen_a, from_b);
        assert_eq!(seen_b, from_a);
        let last = seen_c.last().unwrap();
        assert_eq!(repository.document().await.content(), last);
    }
}
