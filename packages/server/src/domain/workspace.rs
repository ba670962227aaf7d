//! 共有ワークスペース
//!
//! ドキュメント、セッション表、ブロードキャスト対象の接続集合をまとめた集約です。
//! 3 つはプロセス全体で共有される可変状態であり、常に同じ排他制御の内側で
//! 更新されなければなりません（[`super::repository::WorkspaceRepository`] を参照）。
//!
//! ## ブロードキャストの方針
//!
//! - 各接続は有界の outbox（`mpsc::Sender`）を持つ
//! - 送信は `try_send` のみで、ロック保持中にブロックしない
//! - outbox が満杯（遅い接続）または閉じている（切断済み）場合、その接続をメンバーから外す
//!   → sender が drop され、接続側の writer タスクが終了して接続が閉じられる
//! - 1 つの接続の失敗で残りの接続への配送が止まることはない

use std::{collections::HashMap, sync::Arc};

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{
    entity::{Document, Session},
    error::{MessagePushError, SessionError},
    event::ServerEvent,
    value_object::{ConnectionId, SessionToken, Timestamp, Username},
};

/// 接続ごとの outbox
pub type PusherChannel = mpsc::Sender<Arc<ServerEvent>>;

/// セッショントークン → セッションの対応表
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionToken, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しいセッションを発行して登録する
    pub fn open(&mut self, user: Username, connection: ConnectionId, now: Timestamp) -> Session {
        let token = loop {
            let candidate = SessionToken::generate();
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = Session::new(token.clone(), user, connection, now);
        self.sessions.insert(token, session.clone());
        session
    }

    pub fn resolve(&self, token: &SessionToken) -> Option<&Session> {
        self.sessions.get(token)
    }

    /// セッションを破棄する（存在しなくてもよい）
    pub fn revoke(&mut self, token: &SessionToken) -> Option<Session> {
        self.sessions.remove(token)
    }

    /// 指定した接続が作成したセッションを全て破棄する
    pub fn revoke_connection(&mut self, connection: &ConnectionId) -> Vec<Session> {
        let tokens: Vec<SessionToken> = self
            .sessions
            .values()
            .filter(|session| &session.connection == connection)
            .map(|session| session.token.clone())
            .collect();
        tokens
            .iter()
            .filter_map(|token| self.sessions.remove(token))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// ログイン中のユーザー名（重複なし、昇順）
    pub fn users(&self) -> Vec<Username> {
        let mut users: Vec<Username> = self
            .sessions
            .values()
            .map(|session| session.user.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }
}

/// ブロードキャストの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// outbox に積めた接続の数
    pub delivered: usize,
    /// 送信に失敗してメンバーから外された接続
    pub evicted: Vec<ConnectionId>,
}

/// ブロードキャスト対象の接続集合
#[derive(Debug, Default)]
pub struct Membership {
    members: HashMap<ConnectionId, PusherChannel>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を追加する。既に登録済みなら `false`
    pub fn join(&mut self, connection: ConnectionId, channel: PusherChannel) -> bool {
        if self.members.contains_key(&connection) {
            return false;
        }
        self.members.insert(connection, channel);
        true
    }

    /// 接続を外す。登録されていなければ `false`
    pub fn leave(&mut self, connection: &ConnectionId) -> bool {
        self.members.remove(connection).is_some()
    }

    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.members.contains_key(connection)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 1 つの接続にイベントを送る
    ///
    /// outbox が満杯または閉じていれば、その接続をメンバーから外してエラーを返す。
    pub fn push_to(
        &mut self,
        connection: &ConnectionId,
        event: ServerEvent,
    ) -> Result<(), MessagePushError> {
        let channel = self
            .members
            .get(connection)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection.to_string()))?;

        match channel.try_send(Arc::new(event)) {
            Ok(()) => {
                tracing::debug!("Pushed event to connection '{}'", connection);
                Ok(())
            }
            Err(e) => {
                self.members.remove(connection);
                tracing::warn!("Evicted connection '{}' from membership", connection);
                Err(push_error(connection, e))
            }
        }
    }

    /// `exclude` 以外の全メンバーにイベントを送る
    ///
    /// 開始時点のメンバー一覧のコピーを走査する。送信に失敗した接続は走査後にまとめて外す。
    pub fn broadcast(
        &mut self,
        event: ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> BroadcastReport {
        let event = Arc::new(event);
        let targets: Vec<(ConnectionId, PusherChannel)> = self
            .members
            .iter()
            .filter(|(connection, _)| Some(*connection) != exclude)
            .map(|(connection, channel)| (*connection, channel.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (connection, channel) in targets {
            match channel.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    tracing::warn!("{}", push_error(&connection, e));
                    report.evicted.push(connection);
                }
            }
        }

        for connection in &report.evicted {
            self.members.remove(connection);
            tracing::warn!("Evicted connection '{}' from membership", connection);
        }

        report
    }
}

fn push_error<T>(connection: &ConnectionId, error: TrySendError<T>) -> MessagePushError {
    match error {
        TrySendError::Full(_) => MessagePushError::Overflow(connection.to_string()),
        TrySendError::Closed(_) => MessagePushError::Closed(connection.to_string()),
    }
}

/// 接続の後始末の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    /// 後始末の時点でメンバーだったか（2 回目以降は `false`）
    pub was_member: bool,
    /// 破棄されたセッション
    pub revoked: Vec<Session>,
}

/// ドキュメント・セッション表・接続集合をまとめた集約
#[derive(Debug)]
pub struct Workspace {
    document: Document,
    sessions: SessionRegistry,
    members: Membership,
}

impl Workspace {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            sessions: SessionRegistry::new(),
            members: Membership::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// ドキュメント本文を丸ごと置き換える
    pub fn replace_document(&mut self, content: String, now: Timestamp) {
        self.document.replace(content, now);
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn members(&self) -> &Membership {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut Membership {
        &mut self.members
    }

    /// 保護された操作の認可
    ///
    /// トークンが存在し、生きているセッションに解決でき、そのセッションが
    /// リクエスト元の接続によって作成されたものである場合のみ成功する。
    pub fn authorize(
        &self,
        connection: &ConnectionId,
        token: Option<&str>,
    ) -> Result<Session, SessionError> {
        let raw = token.ok_or(SessionError::MissingToken)?;
        let token = SessionToken::parse(raw).map_err(|_| SessionError::InvalidSession)?;
        let session = self
            .sessions
            .resolve(&token)
            .ok_or(SessionError::InvalidSession)?;

        if &session.connection != connection || !self.members.contains(connection) {
            return Err(SessionError::InvalidSession);
        }
        Ok(session.clone())
    }

    /// 接続の後始末: メンバーから外し、その接続が作成したセッションを破棄する
    ///
    /// 何度呼んでも安全（2 回目以降は何もしない）。
    pub fn depart(&mut self, connection: &ConnectionId) -> Departure {
        Departure {
            was_member: self.members.leave(connection),
            revoked: self.sessions.revoke_connection(connection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_workspace() -> Workspace {
        Workspace::new(Document::new(
            "Welcome".to_string(),
            Timestamp::new(1000),
        ))
    }

    fn join(workspace: &mut Workspace, capacity: usize) -> (ConnectionId, mpsc::Receiver<Arc<ServerEvent>>) {
        let (tx, rx) = mpsc::channel(capacity);
        let connection = ConnectionId::generate();
        assert!(workspace.members_mut().join(connection, tx));
        (connection, rx)
    }

    fn alice() -> Username {
        Username::new("alice".to_string()).unwrap()
    }

    #[test]
    fn test_open_session_is_resolvable() {
        // テスト項目: 発行したセッションのトークンが同じユーザーに解決される
        // given (前提条件):
        let mut registry = SessionRegistry::new();
        let connection = ConnectionId::generate();

        // when (操作):
        let session = registry.open(alice(), connection, Timestamp::new(1000));

        // then (期待する結果):
        let resolved = registry.resolve(&session.token).unwrap();
        assert_eq!(resolved.user, alice());
        assert_eq!(resolved.connection, connection);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        // テスト項目: 同じトークンを 2 回破棄しても問題ない
        // given (前提条件):
        let mut registry = SessionRegistry::new();
        let session = registry.open(alice(), ConnectionId::generate(), Timestamp::new(1000));

        // when (操作):
        let first = registry.revoke(&session.token);
        let second = registry.revoke(&session.token);

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(registry.resolve(&session.token).is_none());
    }

    #[test]
    fn test_same_user_may_hold_multiple_sessions() {
        // テスト項目: 同じユーザーが複数のセッションを同時に持てる
        // given (前提条件):
        let mut registry = SessionRegistry::new();

        // when (操作):
        let first = registry.open(alice(), ConnectionId::generate(), Timestamp::new(1000));
        let second = registry.open(alice(), ConnectionId::generate(), Timestamp::new(1000));

        // then (期待する結果):
        assert_ne!(first.token, second.token);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.users(), vec![alice()]);
    }

    #[test]
    fn test_revoke_connection_only_removes_its_sessions() {
        // テスト項目: 接続単位の破棄は他の接続のセッションに影響しない
        // given (前提条件):
        let mut registry = SessionRegistry::new();
        let mine = ConnectionId::generate();
        let other = ConnectionId::generate();
        let my_session = registry.open(alice(), mine, Timestamp::new(1000));
        let other_session = registry.open(alice(), other, Timestamp::new(1000));

        // when (操作):
        let revoked = registry.revoke_connection(&mine);

        // then (期待する結果):
        assert_eq!(revoked, vec![my_session.clone()]);
        assert!(registry.resolve(&my_session.token).is_none());
        assert!(registry.resolve(&other_session.token).is_some());
    }

    #[test]
    fn test_broadcast_excludes_originator() {
        // テスト項目: ブロードキャストは除外指定した接続以外に届く
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let (a, mut rx_a) = join(&mut workspace, 8);
        let (_b, mut rx_b) = join(&mut workspace, 8);
        let (_c, mut rx_c) = join(&mut workspace, 8);

        // when (操作):
        let report = workspace.members_mut().broadcast(
            ServerEvent::EditUpdate {
                content: "hi".to_string(),
            },
            Some(&a),
        );

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert!(report.evicted.is_empty());
        assert!(rx_a.try_recv().is_err());
        let expected = ServerEvent::EditUpdate {
            content: "hi".to_string(),
        };
        assert_eq!(*rx_b.try_recv().unwrap(), expected);
        assert_eq!(*rx_c.try_recv().unwrap(), expected);
    }

    #[test]
    fn test_broadcast_evicts_full_outbox_and_keeps_delivering() {
        // テスト項目: outbox が満杯の接続は外され、他の接続への配送は続く
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let (slow, _rx_slow) = join(&mut workspace, 1);
        let (_fast, mut rx_fast) = join(&mut workspace, 8);
        workspace
            .members_mut()
            .push_to(&slow, ServerEvent::notification("fill"))
            .unwrap();

        // when (操作):
        let report = workspace
            .members_mut()
            .broadcast(ServerEvent::notification("hello"), None);

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, vec![slow]);
        assert!(!workspace.members().contains(&slow));
        assert_eq!(
            *rx_fast.try_recv().unwrap(),
            ServerEvent::notification("hello")
        );
    }

    #[test]
    fn test_broadcast_evicts_closed_outbox() {
        // テスト項目: 受信側が既に閉じている接続は外される
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let (dead, rx_dead) = join(&mut workspace, 8);
        drop(rx_dead);

        // when (操作):
        let report = workspace
            .members_mut()
            .broadcast(ServerEvent::notification("hello"), None);

        // then (期待する結果):
        assert_eq!(report.delivered, 0);
        assert_eq!(report.evicted, vec![dead]);
        assert!(workspace.members().is_empty());
    }

    #[test]
    fn test_push_to_unknown_connection() {
        // テスト項目: メンバーでない接続への送信はエラーになる
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let stranger = ConnectionId::generate();

        // when (操作):
        let result = workspace
            .members_mut()
            .push_to(&stranger, ServerEvent::notification("hello"));

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[test]
    fn test_authorize_requires_owned_live_session() {
        // テスト項目: 認可は「存在する」「自分の接続が作成した」セッションのみ成功する
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let (mine, _rx_mine) = join(&mut workspace, 8);
        let (other, _rx_other) = join(&mut workspace, 8);
        let session = workspace
            .sessions_mut()
            .open(alice(), mine, Timestamp::new(1000));
        let token = session.token.as_str().to_string();

        // when (操作):
        let ok = workspace.authorize(&mine, Some(&token));
        let stolen = workspace.authorize(&other, Some(&token));
        let missing = workspace.authorize(&mine, None);
        let unknown = workspace.authorize(&mine, Some(SessionToken::generate().as_str()));
        let garbage = workspace.authorize(&mine, Some("not-a-token"));

        // then (期待する結果):
        assert_eq!(ok.unwrap().user, alice());
        assert_eq!(stolen, Err(SessionError::InvalidSession));
        assert_eq!(missing, Err(SessionError::MissingToken));
        assert_eq!(unknown, Err(SessionError::InvalidSession));
        assert_eq!(garbage, Err(SessionError::InvalidSession));
    }

    #[test]
    fn test_depart_is_idempotent() {
        // テスト項目: 後始末は 1 回目でメンバー削除とセッション破棄を行い、2 回目は何もしない
        // given (前提条件):
        let mut workspace = create_test_workspace();
        let (connection, _rx) = join(&mut workspace, 8);
        let session = workspace
            .sessions_mut()
            .open(alice(), connection, Timestamp::new(1000));

        // when (操作):
        let first = workspace.depart(&connection);
        let second = workspace.depart(&connection);

        // then (期待する結果):
        assert!(first.was_member);
        assert_eq!(first.revoked, vec![session.clone()]);
        assert_eq!(second, Departure::default());
        assert!(workspace.sessions().resolve(&session.token).is_none());
        assert!(!workspace.members().contains(&connection));
    }
}
