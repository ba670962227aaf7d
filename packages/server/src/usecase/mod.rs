//! UseCase layer
//!
//! 1 つのリクエストに対応する操作を 1 つのユースケースとして定義します。
//! 共有状態に触れる操作は `WorkspaceRepository::lock()` のガードを最初から最後まで保持し、
//! 検証・更新・永続化・ブロードキャストを 1 つのクリティカルセクションで行います。

pub mod connect_client;
pub mod disconnect_client;
pub mod edit_document;
pub mod error;
pub mod get_document;
pub mod get_status;
pub mod login;
pub mod logout;
pub mod new_file;
pub mod save_document;
pub mod send_chat;
pub mod signup;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use edit_document::EditDocumentUseCase;
pub use error::{LoginError, ProtectedError, SignupError};
pub use get_document::GetDocumentUseCase;
pub use get_status::{GetStatusUseCase, ServerStatus};
pub use login::LoginUseCase;
pub use logout::LogoutUseCase;
pub use new_file::NewFileUseCase;
pub use save_document::SaveDocumentUseCase;
pub use send_chat::SendChatUseCase;
pub use signup::SignupUseCase;
