//! Error types for adapter operations.
//!
//! Every adapter operation fails with a single [`FsError`] value. The remote
//! side reports failure as a bare nonzero status, so "not found", "already
//! exists" and transport trouble all surface as [`FsError::RemoteCall`]. The
//! [`RemoteFailure`] detail it carries is for logs, not for branching.

use thiserror::Error;

/// Result type for adapter operations.
pub type FsResult<T> = Result<T, FsError>;

/// Why a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    /// The service answered with a nonzero status.
    #[error("remote status {0}")]
    Status(i64),

    /// The transport could not complete the exchange.
    #[error("transport: {0}")]
    Transport(String),

    /// The service answered with a payload that does not fit the reply shape.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// Errors that can occur in the filesystem adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// Encoded name or content does not fit its buffer.
    #[error("Encoded value needs {required} bytes (capacity: {capacity})")]
    EncodingOverflow { required: usize, capacity: usize },

    /// A remote call failed. Missing entries on the remote side land here too.
    #[error("Remote call '{operation}' failed: {failure}")]
    RemoteCall {
        operation: &'static str,
        failure: RemoteFailure,
    },

    /// Entry name cannot round-trip through a listing.
    #[error("Entry name is not valid UTF-8: {0:?}")]
    InvalidName(String),

    /// A write cannot be represented within the content capacity.
    #[error("Write of {len} bytes at offset {offset} exceeds content capacity {capacity}")]
    SizeLimitExceeded {
        offset: u64,
        len: usize,
        capacity: usize,
    },

    /// The host asked about an inode it never learned.
    #[error("Inode {0} not found")]
    NotFound(u64),

    /// Directory operation on a file.
    #[error("Inode {0} is not a directory")]
    NotADirectory(u64),

    /// Content operation on a directory.
    #[error("Inode {0} is a directory")]
    IsADirectory(u64),

    /// Mount token was rejected before any remote call.
    #[error("Invalid mount token: {0}")]
    InvalidToken(String),

    /// The host could not attach the filesystem.
    #[error("Mount failed: {0}")]
    MountFailed(String),
}

impl FsError {
    pub(crate) fn remote(operation: &'static str, failure: RemoteFailure) -> Self {
        FsError::RemoteCall { operation, failure }
    }

    /// Map to the errno a host filesystem framework expects.
    ///
    /// Remote failures collapse to `EIO`; callers that know the failing
    /// operation was a lookup report `ENOENT` instead.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::EncodingOverflow { .. } => libc::ENAMETOOLONG,
            FsError::InvalidName(_) => libc::EILSEQ,
            FsError::RemoteCall { .. } => libc::EIO,
            FsError::SizeLimitExceeded { .. } => libc::EFBIG,
            FsError::NotFound(_) => libc::ENOENT,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::InvalidToken(_) => libc::EINVAL,
            FsError::MountFailed(_) => libc::EIO,
        }
    }

    /// True when the error came back from the remote side or its transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, FsError::RemoteCall { .. })
    }
}
