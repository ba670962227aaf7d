//! Per-connection actor.
//!
//! 1 つの接続は 2 つのタスクで動く:
//!
//! - receive loop: フレームを読み、[`ConnectionActor::handle`] で状態遷移させる
//! - pusher loop: outbox に積まれたイベントを DTO に変換してフレームとして書き出す
//!
//! どちらかが終わると接続は閉じられ、後始末（メンバーから外す・セッション破棄）が 1 度だけ行われる。
//! receive loop が先に終わった場合は、後始末で outbox の sender が drop されるため、
//! pusher loop は積まれていたイベント（例えば AUTH_FAIL）を書き切ってから終了する。
//! pusher loop が先に終わった場合も receive loop は中断せず、処理中のメッセージを
//! 最後まで処理してから、次のフレームを待つ前に止まる。

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite, WriteHalf},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_util::{
    codec::{FramedRead, FramedWrite},
    sync::CancellationToken,
};

use crate::{
    domain::{
        AuthFailReason, ConnectionId, ServerEvent, SessionToken, Username, WorkspaceRepository,
    },
    infrastructure::{
        codec::{FrameError, ServerCodec},
        dto::wire::{ClientMessage, ServerMessage},
    },
    ui::{config::ServerConfig, state::AppState},
    usecase::{LoginError, ProtectedError},
};

/// receive loop 終了後、pusher loop が残りを書き出すのを待つ上限
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const AUTH_REQUIRED_MESSAGE: &str = "Authentication required.";

/// Frame and outbox limits applied to every connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub max_frame_length: usize,
    pub outbox_capacity: usize,
}

impl From<&ServerConfig> for ConnectionLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_frame_length: config.max_frame_length,
            outbox_capacity: config.outbox_capacity,
        }
    }
}

/// 接続の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unauthenticated,
    Authenticated { user: Username, token: SessionToken },
    Closed,
}

/// メッセージ処理後に接続を続けるかどうか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// 1 つの接続のプロトコル状態機械
pub struct ConnectionActor {
    id: ConnectionId,
    state: ConnectionState,
    app: Arc<AppState>,
}

impl ConnectionActor {
    pub fn new(id: ConnectionId, app: Arc<AppState>) -> Self {
        Self {
            id,
            state: ConnectionState::Unauthenticated,
            app,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// 1 つのメッセージを処理する
    pub async fn handle(&mut self, message: ClientMessage) -> Flow {
        if self.state == ConnectionState::Closed {
            return Flow::Close;
        }

        match message {
            ClientMessage::Hello => self.hello().await,
            ClientMessage::Signup { user, password } => self.signup(user, password).await,
            ClientMessage::Login { user, password } => self.login(user, password).await,
            ClientMessage::Logout { .. } => self.logout().await,
            ClientMessage::Edit { content, token } => {
                if !self.is_authenticated() {
                    return self.reject_unauthorized().await;
                }
                let result = self
                    .app
                    .edit_document_usecase
                    .execute(&self.id, token.as_deref(), content)
                    .await;
                self.finish_protected(result.map(|_| ()), "Edit failed").await
            }
            ClientMessage::Save { token } => {
                if !self.is_authenticated() {
                    return self.reject_unauthorized().await;
                }
                let result = self
                    .app
                    .save_document_usecase
                    .execute(&self.id, token.as_deref())
                    .await;
                self.finish_protected(result.map(|_| ()), "Save failed").await
            }
            ClientMessage::NewFile { token } => {
                if !self.is_authenticated() {
                    return self.reject_unauthorized().await;
                }
                let result = self
                    .app
                    .new_file_usecase
                    .execute(&self.id, token.as_deref())
                    .await;
                self.finish_protected(result.map(|_| ()), "New file failed")
                    .await
            }
            ClientMessage::Chat { text, token } => {
                if !self.is_authenticated() {
                    return self.reject_unauthorized().await;
                }
                let result = self
                    .app
                    .send_chat_usecase
                    .execute(&self.id, token.as_deref(), text)
                    .await;
                self.finish_protected(result.map(|_| ()), "Chat failed").await
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.state, ConnectionState::Authenticated { .. })
    }

    async fn hello(&mut self) -> Flow {
        match self.app.get_document_usecase.execute(&self.id).await {
            Ok(()) => Flow::Continue,
            Err(e) => {
                tracing::debug!("Connection '{}' is gone: {}", self.id, e);
                self.close()
            }
        }
    }

    async fn signup(&mut self, user: String, password: String) -> Flow {
        if self.is_authenticated() {
            return self.already_authenticated().await;
        }

        match self
            .app
            .signup_usecase
            .execute(&self.id, user, &password)
            .await
        {
            Ok(_) => Flow::Continue,
            Err(e) => {
                tracing::warn!("Signup rejected on '{}': {}", self.id, e);
                self.reply(ServerEvent::auth_fail(e.reason(), e.client_message()))
                    .await
            }
        }
    }

    async fn login(&mut self, user: String, password: String) -> Flow {
        if self.is_authenticated() {
            return self.already_authenticated().await;
        }

        match self
            .app
            .login_usecase
            .execute(&self.id, user, &password)
            .await
        {
            Ok(session) => {
                self.state = ConnectionState::Authenticated {
                    user: session.user,
                    token: session.token,
                };
                Flow::Continue
            }
            Err(LoginError::ConnectionClosed) => self.close(),
            Err(e) => {
                self.reply(ServerEvent::auth_fail(e.reason(), e.client_message()))
                    .await
            }
        }
    }

    async fn logout(&mut self) -> Flow {
        self.app.logout_usecase.execute(&self.id).await;
        self.close()
    }

    async fn already_authenticated(&mut self) -> Flow {
        self.reply(ServerEvent::auth_fail(
            AuthFailReason::AlreadyAuthenticated,
            "Already logged in.",
        ))
        .await
    }

    /// 保護された操作の結果を返信に写像する
    async fn finish_protected(&mut self, result: Result<(), ProtectedError>, label: &str) -> Flow {
        match result {
            Ok(()) => Flow::Continue,
            Err(ProtectedError::Unauthorized(e)) => {
                tracing::warn!("Unauthorized request on '{}': {}", self.id, e);
                self.reject_unauthorized().await
            }
            Err(ProtectedError::Storage(e)) => {
                tracing::error!("{} on '{}': {}", label, self.id, e);
                self.reply(ServerEvent::notification(format!("{}: {}", label, e)))
                    .await
            }
        }
    }

    /// AUTH_FAIL{INVALID_SESSION} を返して接続を閉じる
    async fn reject_unauthorized(&mut self) -> Flow {
        // 閉じる前に返信を outbox に積む（pusher loop が書き切ってから閉じる）
        let _ = self
            .app
            .repository
            .push_to(
                &self.id,
                ServerEvent::auth_fail(AuthFailReason::InvalidSession, AUTH_REQUIRED_MESSAGE),
            )
            .await;
        self.close()
    }

    async fn reply(&mut self, event: ServerEvent) -> Flow {
        match self.app.repository.push_to(&self.id, event).await {
            Ok(()) => Flow::Continue,
            Err(e) => {
                tracing::debug!("Reply to '{}' not delivered: {}", self.id, e);
                self.close()
            }
        }
    }

    fn close(&mut self) -> Flow {
        self.state = ConnectionState::Closed;
        Flow::Close
    }
}

/// outbox のイベントを接続に書き出すタスクを起動する
fn pusher_loop<W>(
    mut rx: mpsc::Receiver<Arc<ServerEvent>>,
    mut sink: FramedWrite<W, ServerCodec>,
    connection: ConnectionId,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = sink.send(ServerMessage::from(event.as_ref())).await {
                tracing::debug!("Write to '{}' failed: {}", connection, e);
                return;
            }
        }
        if let Err(e) = sink.close().await {
            tracing::debug!("Closing '{}' failed: {}", connection, e);
        }
    })
}

/// フレームを読み、状態機械に渡し続ける
///
/// `stop` はフレームの間でだけ確認する。処理中のメッセージは途中で捨てない。
async fn receive_loop<R>(
    mut actor: ConnectionActor,
    mut frames: FramedRead<R, ServerCodec>,
    stop: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let connection = actor.id();
    loop {
        let frame = tokio::select! {
            _ = stop.cancelled() => {
                tracing::debug!("Connection '{}' stopped", connection);
                break;
            }
            frame = frames.next() => frame,
        };

        let message = match frame {
            None => {
                tracing::debug!("Connection '{}' closed by peer", connection);
                break;
            }
            Some(Err(FrameError::Io(e))) => {
                tracing::debug!("Connection '{}' transport error: {}", connection, e);
                break;
            }
            Some(Err(e)) => {
                tracing::warn!("Protocol error on '{}': {}", connection, e);
                break;
            }
            Some(Ok(message)) => message,
        };

        tracing::debug!("Received {} from '{}'", message.kind(), connection);
        if actor.handle(message).await == Flow::Close {
            break;
        }
    }
}

/// 1 つの接続を最後まで処理する
pub async fn handle_connection<S>(
    stream: S,
    state: Arc<AppState>,
    limits: ConnectionLimits,
    shutdown: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let connection = ConnectionId::generate();
    let (reader, writer) = tokio::io::split(stream);

    let (tx, rx) = mpsc::channel(limits.outbox_capacity);
    if !state.connect_client_usecase.execute(connection, tx).await {
        return;
    }

    let sink: FramedWrite<WriteHalf<S>, ServerCodec> =
        FramedWrite::new(writer, ServerCodec::new(limits.max_frame_length));
    let mut writer_task = pusher_loop(rx, sink, connection);

    let frames = FramedRead::new(reader, ServerCodec::new(limits.max_frame_length));
    let actor = ConnectionActor::new(connection, state.clone());
    let stop = shutdown.child_token();
    let mut reader_task = tokio::spawn(receive_loop(actor, frames, stop.clone()));

    tokio::select! {
        _ = &mut reader_task => {
            state.disconnect_client_usecase.execute(&connection).await;
            if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task).await.is_err() {
                tracing::warn!("Connection '{}' did not drain its outbox in time", connection);
                writer_task.abort();
            }
        }
        _ = &mut writer_task => {
            stop.cancel();
            if let Err(e) = reader_task.await {
                tracing::error!("Receive loop of '{}' failed: {}", connection, e);
            }
            state.disconnect_client_usecase.execute(&connection).await;
        }
    }
}
