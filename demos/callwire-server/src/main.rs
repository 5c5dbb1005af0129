//! Runnable JSON-RPC demo server.
//!
//! Serves the full demo method set (tax calculation, arithmetic, user CRUD,
//! system utilities) over a single HTTP POST endpoint.
//!
//! ```bash
//! callwire-server --bind 127.0.0.1:8001
//! curl -X POST http://127.0.0.1:8001/jsonrpc \
//!   -H "Content-Type: application/json" \
//!   -d '{"jsonrpc":"2.0","method":"ping","id":1}'
//! ```

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use callwire_http_server::RpcServer;

#[derive(Debug, Parser)]
#[command(name = "callwire-server", version, about = "JSON-RPC 2.0 demo server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8001")]
    bind: SocketAddr,

    /// Path of the JSON-RPC endpoint
    #[arg(long, default_value = "/jsonrpc")]
    path: String,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> callwire_http_server::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let server = RpcServer::builder()
        .bind_address(args.bind)
        .rpc_path(&args.path)
        .cors(!args.no_cors)
        .registry(callwire_methods::registry())
        .build();

    info!(
        "Starting JSON-RPC server on http://{}{}",
        args.bind, args.path
    );
    for method in server.dispatcher().registry().method_names() {
        info!("  - {}", method);
    }

    server.run().await
}
