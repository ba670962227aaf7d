//! Admin HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    infrastructure::dto::http::{DocumentDto, StatusDto},
    ui::state::AppState,
};
use kakiba_shared::time::timestamp_to_jst_rfc3339;

/// Build the admin router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/document", get(get_document))
        .route("/api/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current shared document
pub async fn get_document(State(state): State<Arc<AppState>>) -> Json<DocumentDto> {
    let document = state.get_document_usecase.snapshot().await;

    // Domain Model から DTO への変換
    Json(DocumentDto {
        content: document.content().to_string(),
        length: document.content().chars().count(),
        updated_at: timestamp_to_jst_rfc3339(document.updated_at().value()),
    })
}

/// Connection and session counts
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    let status = state.get_status_usecase.execute().await;

    Json(StatusDto {
        connections: status.connections,
        sessions: status.sessions,
        authenticated_users: status
            .authenticated_users
            .into_iter()
            .map(|user| user.into_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Document, Timestamp, Workspace, WorkspaceRepository, repository::MockDocumentStorage,
    };
    use crate::infrastructure::{
        credential::InMemoryCredentialStore, repository::InMemoryWorkspaceRepository,
    };
    use kakiba_shared::time::FixedClock;
    use tokio::sync::Mutex;

    fn create_state() -> (Arc<InMemoryWorkspaceRepository>, Arc<AppState>) {
        let workspace = Workspace::new(Document::new("héllo".to_string(), Timestamp::new(0)));
        let repository = Arc::new(InMemoryWorkspaceRepository::new(Arc::new(Mutex::new(
            workspace,
        ))));
        let state = Arc::new(AppState::new(
            repository.clone(),
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(MockDocumentStorage::new()),
            Arc::new(FixedClock::new(0)),
        ));
        (repository, state)
    }

    #[tokio::test]
    async fn test_get_document_counts_characters() {
        // テスト項目: ドキュメントの長さは文字数で返される
        // given (前提条件):
        let (_repository, state) = create_state();

        // when (操作):
        let Json(dto) = get_document(State(state)).await;

        // then (期待する結果):
        assert_eq!(dto.content, "héllo");
        assert_eq!(dto.length, 5);
        assert_eq!(dto.updated_at, "1970-01-01T09:00:00+09:00");
    }

    #[tokio::test]
    async fn test_get_status_empty() {
        // テスト項目: 接続が無い場合は全て 0
        // given (前提条件):
        let (repository, state) = create_state();

        // when (操作):
        let Json(dto) = get_status(State(state)).await;

        // then (期待する結果):
        assert_eq!(dto.connections, repository.count_connections().await);
        assert_eq!(dto.sessions, 0);
        assert!(dto.authenticated_users.is_empty());
    }
}
