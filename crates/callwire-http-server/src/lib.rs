//! # HTTP transport for the callwire JSON-RPC dispatcher
//!
//! A single-endpoint HTTP binding: POST bodies are fed to the dispatcher and
//! its output is mapped back per the JSON-RPC-over-HTTP convention — empty
//! dispatch output becomes 204 No Content, everything else ships as a 200
//! JSON body, protocol error envelopes included (protocol errors are not
//! HTTP errors).

pub mod cors;
pub mod handler;
pub mod server;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::RpcHttpHandler;
pub use server::{RpcServer, RpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use callwire_json_rpc::{DispatchOutput, Dispatcher, MethodRegistry};

/// Result type for HTTP server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Transport-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
