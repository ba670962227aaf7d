//! サーバーから接続へ送られるイベント
//!
//! ドメイン層はワイヤーフォーマットを知らない。各接続の outbox にはこのイベントが積まれ、
//! UI 層の writer タスクが DTO に変換してフレームとして送信する。

use super::value_object::{SessionToken, Username};

/// 認証失敗の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailReason {
    /// サインアップ: ユーザー名が既に使われている
    NameTaken,
    /// サインアップ: ユーザー名の形式が不正
    InvalidUsername,
    /// ログイン: ユーザー名またはパスワードが違う
    BadCredentials,
    /// 認証済みの接続からの SIGNUP / LOGIN
    AlreadyAuthenticated,
    /// 保護された操作: トークンが無い、または解決できない（接続は切断される）
    InvalidSession,
    /// 資格情報ストアの障害
    Internal,
}

/// 接続へ送られるイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// 現在のドキュメント全文
    DocState { content: String },
    /// 他の接続による編集結果
    EditUpdate { content: String },
    /// サインアップ成功
    SignedUp { message: String },
    /// ログイン成功
    LoggedIn { token: SessionToken, user: Username },
    /// 認証・認可の失敗
    AuthFail {
        reason: AuthFailReason,
        message: String,
    },
    /// 保存などのお知らせ
    Notification { message: String },
    /// チャット
    Chat { user: Username, text: String },
}

impl ServerEvent {
    pub fn auth_fail(reason: AuthFailReason, message: impl Into<String>) -> Self {
        Self::AuthFail {
            reason,
            message: message.into(),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
        }
    }
}
