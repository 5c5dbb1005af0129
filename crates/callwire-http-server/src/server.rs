//! HTTP server: configuration, builder, and the accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use callwire_json_rpc::{Dispatcher, MethodRegistry, RpcMethod};

use crate::cors::CorsLayer;
use crate::handler::RpcHttpHandler;
use crate::Result;

/// Configuration for the JSON-RPC HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path of the JSON-RPC endpoint
    pub rpc_path: String,
    /// Enable CORS headers on every response
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8001)),
            rpc_path: "/jsonrpc".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for the JSON-RPC HTTP server
pub struct RpcServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
}

impl RpcServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: MethodRegistry::new(),
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Register a handler for a single method name
    pub fn register<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: RpcMethod + 'static,
    {
        self.registry.register(method, handler);
        self
    }

    /// Register a handler under every name it declares
    pub fn register_service<H>(mut self, handler: H) -> Self
    where
        H: RpcMethod + 'static,
    {
        self.registry.register_service(handler);
        self
    }

    /// Replace the registry wholesale
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the server
    pub fn build(self) -> RpcServer {
        let dispatcher = Arc::new(Dispatcher::new(self.registry));
        RpcServer {
            handler: RpcHttpHandler::new(self.config.clone(), Arc::clone(&dispatcher)),
            config: self.config,
            dispatcher,
        }
    }
}

impl Default for RpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON-RPC HTTP server
#[derive(Clone)]
pub struct RpcServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    handler: RpcHttpHandler,
}

impl RpcServer {
    pub fn builder() -> RpcServerBuilder {
        RpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the accept loop. Serves connections until the process exits.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        info!("JSON-RPC server listening on {}", self.config.bind_address);
        info!("Endpoint available at: {}", self.config.rpc_path);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            let enable_cors = self.config.enable_cors;
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service =
                    service_fn(move |req| serve_request(req, handler.clone(), enable_cors));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Clients hanging up mid-message is routine, not an error.
                    let err_str = err.to_string();
                    if err_str.contains("connection closed before message completed") {
                        debug!("Client disconnected: {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

async fn serve_request(
    req: Request<hyper::body::Incoming>,
    handler: RpcHttpHandler,
    enable_cors: bool,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let mut response = match handler.handle(req).await {
        Ok(response) => response,
        Err(err) => {
            error!("Request handling error: {}", err);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from(format!(
                    "Internal Server Error: {}",
                    err
                ))))
                .expect("static response")
        }
    };

    if enable_cors {
        CorsLayer::apply_cors_headers(response.headers_mut());
    }
    Ok(response)
}
