//! UseCase: サーバー状態の取得（管理用 HTTP）

use std::sync::Arc;

use crate::domain::{Username, WorkspaceRepository};

/// サーバー状態のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub connections: usize,
    pub sessions: usize,
    pub authenticated_users: Vec<Username>,
}

pub struct GetStatusUseCase {
    repository: Arc<dyn WorkspaceRepository>,
}

impl GetStatusUseCase {
    pub fn new(repository: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> ServerStatus {
        let workspace = self.repository.lock().await;
        ServerStatus {
            connections: workspace.members().len(),
            sessions: workspace.sessions().len(),
            authenticated_users: workspace.sessions().users(),
        }
    }
}
