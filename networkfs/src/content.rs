//! Bounded access to file content.
//!
//! The service stores at most [`MAX_CONTENT`] bytes per file and only ever
//! exchanges whole buffers. A read fetches everything and slices locally;
//! a write rebuilds the prefix up to its end and replaces the stored content
//! with it, so anything past the end of a write is dropped.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{FsError, FsResult};
use crate::mount::MountContext;
use crate::name::{self, CONTENT_CAPACITY};
use crate::remote::{op, RemoteCall, RpcClient};
use crate::types::{ContentBuffer, Inode, MAX_CONTENT};

/// What to do with write bytes that would land past [`MAX_CONTENT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Store what fits and report the shorter length.
    #[default]
    Truncate,
    /// Refuse the write with `SizeLimitExceeded`.
    Reject,
}

impl OversizePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversizePolicy::Truncate => "truncate",
            OversizePolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(OversizePolicy::Truncate),
            "reject" => Ok(OversizePolicy::Reject),
            other => Err(format!(
                "unknown oversize policy '{}' (expected truncate or reject)",
                other
            )),
        }
    }
}

/// Number of bytes a read returns for content of length `content_len`.
pub fn read_len(content_len: usize, offset: u64, length: usize) -> usize {
    let available = (content_len as u64).saturating_sub(offset);
    length.min(available as usize)
}

/// Read and write file content through one remote client.
pub struct ContentAccessor<'a, C> {
    client: &'a RpcClient<C>,
    policy: OversizePolicy,
}

impl<'a, C: RemoteCall> ContentAccessor<'a, C> {
    pub fn new(client: &'a RpcClient<C>, policy: OversizePolicy) -> Self {
        Self { client, policy }
    }

    /// Whole stored content of `inode`.
    pub fn fetch(&self, ctx: &MountContext, inode: Inode) -> FsResult<ContentBuffer> {
        self.client.read(ctx, inode)
    }

    /// Up to `length` bytes starting at `offset`.
    ///
    /// Reading at or past the end returns no bytes rather than an error.
    pub fn read(
        &self,
        ctx: &MountContext,
        inode: Inode,
        offset: u64,
        length: usize,
    ) -> FsResult<Vec<u8>> {
        let content = self.fetch(ctx, inode)?;
        let n = read_len(content.len(), offset, length);
        if n == 0 {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        Ok(content.as_bytes()[start..start + n].to_vec())
    }

    /// Write `bytes` at `offset` and return how many were stored.
    ///
    /// A nonzero offset reads the current content first; bytes between its
    /// end and `offset` are zero-filled. The stored content afterwards is
    /// exactly the prefix ending at the last written byte.
    pub fn write(
        &self,
        ctx: &MountContext,
        inode: Inode,
        offset: u64,
        bytes: &[u8],
    ) -> FsResult<usize> {
        if offset > MAX_CONTENT as u64 {
            return Err(FsError::SizeLimitExceeded {
                offset,
                len: bytes.len(),
                capacity: MAX_CONTENT,
            });
        }
        let start = offset as usize;
        let room = MAX_CONTENT - start;

        let write_len = if bytes.len() > room {
            match self.policy {
                OversizePolicy::Reject => {
                    return Err(FsError::SizeLimitExceeded {
                        offset,
                        len: bytes.len(),
                        capacity: MAX_CONTENT,
                    })
                }
                OversizePolicy::Truncate => {
                    warn!(
                        inode,
                        offset,
                        requested = bytes.len(),
                        stored = room,
                        "Write exceeds content capacity, dropping excess bytes"
                    );
                    room
                }
            }
        } else {
            bytes.len()
        };

        let mut content = if offset != 0 {
            self.fetch(ctx, inode)?.into_vec()
        } else {
            Vec::new()
        };

        let end = start + write_len;
        content.resize(end, 0);
        content[start..end].copy_from_slice(&bytes[..write_len]);

        self.store(ctx, inode, &content)?;
        debug!(inode, offset, written = write_len, stored = end, "Wrote content");
        Ok(write_len)
    }

    /// Replace the stored content of `inode` with `content`.
    pub fn store(&self, ctx: &MountContext, inode: Inode, content: &[u8]) -> FsResult<()> {
        if content.len() > MAX_CONTENT {
            return Err(FsError::SizeLimitExceeded {
                offset: 0,
                len: content.len(),
                capacity: MAX_CONTENT,
            });
        }
        let encoded = name::encode_with_capacity(content, CONTENT_CAPACITY)?;
        self.client.invoke_unit(
            ctx,
            op::WRITE,
            &[("inode", inode.to_string()), ("content", encoded)],
        )
    }

    /// Drop all content of `inode`.
    pub fn truncate(&self, ctx: &MountContext, inode: Inode) -> FsResult<()> {
        self.store(ctx, inode, &[])
    }
}
