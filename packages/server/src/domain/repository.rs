//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::MutexGuard;

use super::{
    entity::Document, error::MessagePushError, error::StorageError, event::ServerEvent,
    value_object::ConnectionId, workspace::Workspace,
};

/// 排他制御の内側にあるワークスペースへの参照
pub type WorkspaceGuard<'a> = MutexGuard<'a, Workspace>;

/// Workspace Repository trait
///
/// ドキュメント・セッション表・接続集合を 1 つの排他制御で保護します。
/// UseCase は `lock()` で得たガードを操作の最初から最後まで保持し、
/// 「検証 → 更新 → (永続化) → ブロードキャスト」を 1 つのクリティカルセクションで行います。
/// これにより、ドキュメントの更新順とブロードキャストの配送順が一致します。
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// 排他制御に入る
    async fn lock(&self) -> WorkspaceGuard<'_>;

    /// 現在のドキュメントのスナップショット
    async fn document(&self) -> Document {
        self.lock().await.document().clone()
    }

    /// 1 つの接続にイベントを送る
    async fn push_to(
        &self,
        connection: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.lock().await.members_mut().push_to(connection, event)
    }

    /// 接続中のクライアント数
    async fn count_connections(&self) -> usize {
        self.lock().await.members().len()
    }
}

/// ドキュメント永続化のインターフェース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// 保存済みのドキュメントを読み込む。無ければ既定の本文を保存して返す
    async fn load(&self) -> Result<String, StorageError>;

    /// ドキュメント本文を保存する
    async fn save(&self, content: &str) -> Result<(), StorageError>;
}
