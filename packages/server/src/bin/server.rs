//! Collaborative notepad server.
//!
//! Serves one shared plain-text document over a length-prefixed JSON protocol on TCP,
//! with an admin HTTP surface on a second port.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakiba-server
//! cargo run --bin kakiba-server -- --host 0.0.0.0 --port 9000 --no-http
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use kakiba_server::{
    domain::{DEFAULT_DOCUMENT, Document, DocumentStorage, Timestamp, Workspace},
    infrastructure::{
        codec::DEFAULT_MAX_FRAME_LENGTH,
        credential::{InMemoryCredentialStore, hasher},
        repository::InMemoryWorkspaceRepository, storage::FileDocumentStorage,
    },
    ui::{Server, ServerConfig, config::DEFAULT_OUTBOX_CAPACITY, shutdown_signal, state::AppState},
};
use kakiba_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "kakiba-server")]
#[command(about = "Collaborative notepad server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KAKIBA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number for the editor protocol
    #[arg(short = 'p', long, env = "KAKIBA_PORT", default_value = "8080")]
    port: u16,

    /// Port number for the admin HTTP API
    #[arg(long, env = "KAKIBA_HTTP_PORT", default_value = "8081")]
    http_port: u16,

    /// Disable the admin HTTP API
    #[arg(long, env = "KAKIBA_NO_HTTP")]
    no_http: bool,

    /// File the shared document is persisted to
    #[arg(long, env = "KAKIBA_DOCUMENT_PATH", default_value = "documents/master_doc.txt")]
    document_path: PathBuf,

    /// File accounts are persisted to
    #[arg(long, env = "KAKIBA_ACCOUNTS_PATH", default_value = "documents/accounts.json")]
    accounts_path: PathBuf,

    /// Keep accounts in memory only
    #[arg(long, env = "KAKIBA_EPHEMERAL_ACCOUNTS")]
    ephemeral_accounts: bool,

    /// Maximum payload length of a single frame in bytes
    #[arg(long, env = "KAKIBA_MAX_FRAME_LENGTH", default_value_t = DEFAULT_MAX_FRAME_LENGTH)]
    max_frame_length: usize,

    /// Events a connection may have queued before it is dropped
    #[arg(long, env = "KAKIBA_OUTBOX_CAPACITY", default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// bcrypt cost for new password hashes
    #[arg(long, env = "KAKIBA_BCRYPT_COST", default_value_t = hasher::DEFAULT_COST)]
    bcrypt_cost: u32,

    /// Create an `admin` account with this password if it does not exist
    #[arg(long, env = "KAKIBA_ADMIN_PASSWORD")]
    admin_password: Option<String>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            http_port: (!self.no_http).then_some(self.http_port),
            max_frame_length: self.max_frame_length,
            outbox_capacity: self.outbox_capacity.max(1),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Document storage and the initial document
    // 2. Credential store
    // 3. Repository
    // 4. AppState (UseCases)
    // 5. Server

    // 1. Load the document (writes the default greeting on first start)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage = Arc::new(FileDocumentStorage::new(
        args.document_path.clone(),
        DEFAULT_DOCUMENT,
    ));
    let content = match storage.load().await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(
                "Failed to load document from {}: {}",
                args.document_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    // 2. Open the credential store
    let credentials = if args.ephemeral_accounts {
        InMemoryCredentialStore::new()
    } else {
        match InMemoryCredentialStore::open(&args.accounts_path).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(
                    "Failed to open accounts at {}: {}",
                    args.accounts_path.display(),
                    e
                );
                std::process::exit(1);
            }
        }
    };
    let credentials = credentials.with_cost(args.bcrypt_cost.clamp(hasher::MIN_COST, 31));
    if let Some(password) = &args.admin_password
        && let Err(e) = credentials.seed_admin(password).await
    {
        tracing::error!("Failed to seed admin account: {}", e);
        std::process::exit(1);
    }

    // 3. Create Repository (in-memory workspace)
    let workspace = Workspace::new(Document::new(
        content,
        Timestamp::new(clock.now_jst_millis()),
    ));
    let repository = Arc::new(InMemoryWorkspaceRepository::new(Arc::new(Mutex::new(
        workspace,
    ))));

    // 4. Create UseCases
    let state = Arc::new(AppState::new(
        repository,
        Arc::new(credentials),
        storage,
        clock,
    ));

    // 5. Create and run the server
    let server = Server::new(state, args.server_config());
    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
