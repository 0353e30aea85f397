//! Remote call layer.
//!
//! A transport implements [`RemoteCall`]: one synchronous request/response
//! exchange per call. [`RpcClient`] sits on top of it, turns nonzero status
//! into [`FsError::RemoteCall`](crate::FsError::RemoteCall) and decodes the
//! payload of each operation into its typed reply.
//!
//! # Transports
//!
//! - [`HttpTransport`] - the networked service over blocking HTTP
//! - [`MemoryRemote`] - an in-process service with the same semantics

mod client;
mod http;
mod memory;

pub use client::RpcClient;
pub use http::{HttpTransport, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use memory::MemoryRemote;

use thiserror::Error;

/// Operation tags understood by the service.
pub mod op {
    pub const LIST: &str = "list";
    pub const LOOKUP: &str = "lookup";
    pub const CREATE: &str = "create";
    pub const UNLINK: &str = "unlink";
    pub const RMDIR: &str = "rmdir";
    pub const LINK: &str = "link";
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
}

/// Raw answer to one remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Zero on success; any other value is a failure.
    pub status: i64,
    /// Operation-defined payload; `Null` when the operation has none.
    pub payload: serde_json::Value,
}

impl Reply {
    pub fn ok(payload: serde_json::Value) -> Self {
        Self { status: 0, payload }
    }

    pub fn empty() -> Self {
        Self::ok(serde_json::Value::Null)
    }

    pub fn status(status: i64) -> Self {
        Self {
            status,
            payload: serde_json::Value::Null,
        }
    }
}

/// The exchange itself did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Trait for performing remote calls.
///
/// Parameter values are passed through verbatim; callers encode names and
/// content before building them.
pub trait RemoteCall: Send + Sync {
    /// Perform one call and block until the service answers or the
    /// transport gives up.
    fn invoke(
        &self,
        token: &str,
        operation: &str,
        params: &[(&str, String)],
    ) -> Result<Reply, TransportError>;
}

impl<T: RemoteCall + ?Sized> RemoteCall for std::sync::Arc<T> {
    fn invoke(
        &self,
        token: &str,
        operation: &str,
        params: &[(&str, String)],
    ) -> Result<Reply, TransportError> {
        (**self).invoke(token, operation, params)
    }
}
