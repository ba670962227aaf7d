//! One connection to the editor server.

use futures_util::{SinkExt, StreamExt};
use kakiba_server::infrastructure::{codec::ClientCodec, dto::wire::ClientMessage};
use kakiba_shared::time::get_jst_timestamp;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::codec::Framed;

use crate::{
    command::parse,
    domain::{Action, LocalView},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// How a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user quit, or input ended
    Quit,
    /// The user logged out; the server closes the connection
    LoggedOut,
}

/// Run a client session until the user quits or the connection breaks
///
/// The session token is forgotten on entry, since the server binds it to
/// the previous connection. The document copy is refreshed by `HELLO`.
pub async fn run_client_session(
    addr: &str,
    view: &mut LocalView,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let stream = TcpStream::connect(addr).await?;
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY: {}", e);
    }
    view.reset_session();

    let mut frames = Framed::new(stream, ClientCodec::default());
    frames.send(ClientMessage::Hello).await?;

    tracing::info!("Connected to {}", addr);
    println!("\nConnected. Type /help for commands, /quit to exit.\n");

    loop {
        tokio::select! {
            frame = frames.next() => {
                match frame {
                    Some(Ok(message)) => {
                        view.apply(&message);
                        print!(
                            "{}",
                            MessageFormatter::format_server_message(&message, get_jst_timestamp())
                        );
                        redisplay_prompt();
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(ClientError::Disconnected),
                }
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    return Ok(SessionEnd::Quit);
                };
                let command = match parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match view.prepare(command) {
                    Action::Send(message) => {
                        tracing::debug!("Sending {}", message.kind());
                        frames.send(message).await?;
                    }
                    Action::SendAndClose(message) => {
                        frames.send(message).await?;
                        println!("Logged out.");
                        return Ok(SessionEnd::LoggedOut);
                    }
                    Action::Print(text) => println!("{}", text),
                    Action::Help => print!("{}", MessageFormatter::format_help()),
                    Action::Quit => return Ok(SessionEnd::Quit),
                }
            }
        }
    }
}
