//! Server state shared by every connection and HTTP handler.

use std::sync::Arc;

use kakiba_shared::time::Clock;

use crate::{
    domain::{CredentialStore, DocumentStorage, WorkspaceRepository},
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, EditDocumentUseCase, GetDocumentUseCase,
        GetStatusUseCase, LoginUseCase, LogoutUseCase, NewFileUseCase, SaveDocumentUseCase,
        SendChatUseCase, SignupUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// Repository（接続への直接の返信に使う）
    pub repository: Arc<dyn WorkspaceRepository>,
    /// ConnectClientUseCase（接続登録のユースケース）
    pub connect_client_usecase: ConnectClientUseCase,
    /// DisconnectClientUseCase（接続後始末のユースケース）
    pub disconnect_client_usecase: DisconnectClientUseCase,
    /// GetDocumentUseCase（HELLO / ドキュメント取得）
    pub get_document_usecase: GetDocumentUseCase,
    pub signup_usecase: SignupUseCase,
    pub login_usecase: LoginUseCase,
    pub logout_usecase: LogoutUseCase,
    pub edit_document_usecase: EditDocumentUseCase,
    pub save_document_usecase: SaveDocumentUseCase,
    pub new_file_usecase: NewFileUseCase,
    pub send_chat_usecase: SendChatUseCase,
    /// GetStatusUseCase（管理用 HTTP）
    pub get_status_usecase: GetStatusUseCase,
}

impl AppState {
    /// Wire every usecase to the given repository and services
    pub fn new(
        repository: Arc<dyn WorkspaceRepository>,
        credentials: Arc<dyn CredentialStore>,
        storage: Arc<dyn DocumentStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_client_usecase: ConnectClientUseCase::new(repository.clone()),
            disconnect_client_usecase: DisconnectClientUseCase::new(repository.clone()),
            get_document_usecase: GetDocumentUseCase::new(repository.clone()),
            signup_usecase: SignupUseCase::new(repository.clone(), credentials.clone()),
            login_usecase: LoginUseCase::new(repository.clone(), credentials, clock.clone()),
            logout_usecase: LogoutUseCase::new(repository.clone()),
            edit_document_usecase: EditDocumentUseCase::new(repository.clone(), clock.clone()),
            save_document_usecase: SaveDocumentUseCase::new(repository.clone(), storage.clone()),
            new_file_usecase: NewFileUseCase::new(repository.clone(), storage, clock),
            send_chat_usecase: SendChatUseCase::new(repository.clone()),
            get_status_usecase: GetStatusUseCase::new(repository.clone()),
            repository,
        }
    }
}
