//! Terminal client for the collaborative notepad.
//!
//! Connects to the editor server, keeps a local copy of the shared document and
//! sends commands typed at the prompt. Lines that are not commands are sent as chat.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval),
//! but not after `/logout` or `/quit`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakiba-client
//! cargo run --bin kakiba-client -- --addr 10.0.0.5:9000
//! ```

use clap::Parser;
use kakiba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kakiba-client")]
#[command(about = "Terminal client for the collaborative notepad", long_about = None)]
struct Args {
    /// Server address (host:port)
    #[arg(short = 'a', long, env = "KAKIBA_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = kakiba_client::run_client(args.addr).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
