//! # JSON-RPC 2.0 Dispatch Core
//!
//! A pure, transport-agnostic JSON-RPC 2.0 implementation: envelope types,
//! a method registry, and a dispatcher that handles single requests,
//! notifications, and batches per the specification.
//!
//! ## Features
//! - Full JSON-RPC 2.0 envelope semantics (id echoing, notification
//!   suppression, order-preserving batches)
//! - Explicit error taxonomy mapped to the standard error codes
//! - Async handlers via `async-trait`; handler failures never escape the
//!   dispatch boundary

pub mod dispatch;
pub mod error;
pub mod notification;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use dispatch::{DispatchOutput, Dispatcher};
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use notification::JsonRpcNotification;
pub use registry::{MethodError, MethodRegistry, RpcMethod, decode_params};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
