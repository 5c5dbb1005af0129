//! HTTP request handling: routing, body plumbing, and the status mapping
//! between dispatch output and HTTP responses.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use callwire_json_rpc::{DispatchOutput, Dispatcher, JsonRpcError, JsonRpcMessage};

use crate::server::ServerConfig;
use crate::{Result, ServerError};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Routes HTTP requests to the dispatcher and the auxiliary endpoints.
#[derive(Clone)]
pub struct RpcHttpHandler {
    pub(crate) config: ServerConfig,
    pub(crate) dispatcher: Arc<Dispatcher>,
}

impl RpcHttpHandler {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Handle one HTTP request.
    pub async fn handle(&self, req: Request<hyper::body::Incoming>) -> Result<Response<Full<Bytes>>> {
        let (parts, body) = req.into_parts();
        let body_bytes = body.collect().await?.to_bytes();
        self.respond(&parts.method, parts.uri.path(), body_bytes)
            .await
    }

    /// Route a request that has already been read off the wire.
    pub(crate) async fn respond(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> Result<Response<Full<Bytes>>> {
        debug!("Handling {} {}", method, path);

        match (method, path) {
            (&Method::POST, p) if p == self.config.rpc_path => self.handle_rpc(body).await,
            (&Method::GET, "/health") => json_response(
                StatusCode::OK,
                &json!({"status": "healthy", "server": "JSON-RPC"}),
            ),
            (&Method::GET, "/") => json_response(StatusCode::OK, &self.info_body()),
            (&Method::OPTIONS, _) => Ok(Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Full::new(Bytes::new()))
                .expect("static response")),
            (_, p) if p == self.config.rpc_path || p == "/health" || p == "/" => {
                Ok(Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .body(Full::new(Bytes::from("Method Not Allowed")))
                    .expect("static response"))
            }
            _ => Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("Not Found")))
                .expect("static response")),
        }
    }

    /// POST endpoint: dispatch and map the output. Empty output (lone
    /// notification, or a batch of them) becomes 204 No Content; anything
    /// else is a 200 with the JSON body, error envelopes included.
    async fn handle_rpc(&self, body: Bytes) -> Result<Response<Full<Bytes>>> {
        if body.len() > self.config.max_body_size {
            warn!("Request body too large: {} bytes", body.len());
            return Ok(Response::builder()
                .status(StatusCode::PAYLOAD_TOO_LARGE)
                .body(Full::new(Bytes::from("Request body too large")))
                .expect("static response"));
        }

        let output = match std::str::from_utf8(&body) {
            Ok(text) => self.dispatcher.dispatch_text(text).await,
            Err(err) => {
                // Not decodable as JSON either way; answer with the protocol's
                // parse error rather than a transport fault.
                debug!("Request body is not valid UTF-8: {}", err);
                DispatchOutput::Single(JsonRpcMessage::Error(JsonRpcError::parse_error()))
            }
        };

        match output.to_body()? {
            None => Ok(Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Full::new(Bytes::new()))
                .expect("static response")),
            Some(json_body) => Ok(Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(Full::new(Bytes::from(json_body)))
                .expect("static response")),
        }
    }

    fn info_body(&self) -> serde_json::Value {
        json!({
            "server": "JSON-RPC Server",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoint": self.config.rpc_path,
            "methods": self.dispatcher.registry().method_names(),
        })
    }
}

fn json_response(
    status: StatusCode,
    body: &serde_json::Value,
) -> Result<Response<Full<Bytes>>> {
    let body = serde_json::to_string(body).map_err(ServerError::Serialization)?;
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Full::new(Bytes::from(body)))
        .expect("static response"))
}
