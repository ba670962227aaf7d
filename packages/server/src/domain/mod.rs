//! Domain layer
//!
//! ドメインモデル（値オブジェクト、エンティティ、共有ワークスペース）と、
//! ドメイン層が必要とする外部サービスのインターフェース（trait）を定義します。

pub mod credential;
pub mod entity;
pub mod error;
pub mod event;
pub mod repository;
pub mod value_object;
pub mod workspace;

pub use credential::CredentialStore;
pub use entity::{Document, Session};
pub use error::{CredentialError, MessagePushError, SessionError, StorageError, ValueObjectError};
pub use event::{AuthFailReason, ServerEvent};
pub use repository::{DocumentStorage, WorkspaceGuard, WorkspaceRepository};
pub use value_object::{ConnectionId, SessionToken, Timestamp, UserId, Username};
pub use workspace::{
    BroadcastReport, Departure, Membership, PusherChannel, SessionRegistry, Workspace,
};

/// Document body used when nothing has been persisted yet.
pub const DEFAULT_DOCUMENT: &str = "Welcome to the Collaborative Notepad!";
