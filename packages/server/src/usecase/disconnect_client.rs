//! UseCase: 接続の後始末
//!
//! 接続が閉じられたとき（正常切断・プロトコル違反・ログアウト・outbox 溢れ）に 1 度だけ呼ばれる。
//! メンバーから外し、その接続が作成したセッションを全て破棄する。
//! 2 回目以降の呼び出しは何もしない。

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, WorkspaceRepository};

pub struct DisconnectClientUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl DisconnectClientUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, connection: &ConnectionId) -> Departure {
        let mut workspace = self.repository.lock().await;
        let departure = workspace.depart(connection);
        if departure.was_member || !departure.revoked.is_empty() {
            tracing::info!(
                "Connection '{}' left ({} session(s) revoked, {} connected)",
                connection,
                departure.revoked.len(),
                workspace.members().len()
            );
        }
        departure
    }
}
