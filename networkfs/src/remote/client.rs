//! Typed wrapper over a [`RemoteCall`] transport.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{op, RemoteCall};
use crate::error::{FsError, FsResult, RemoteFailure};
use crate::mount::MountContext;
use crate::types::{
    ContentBuffer, DirEntry, EntriesPage, EntryInfo, Inode, NodeKind, WireContent, WireEntries,
    WireEntryInfo, MAX_CONTENT,
};

/// Remote call client bound to one transport.
///
/// Each method is exactly one remote call. Nothing is retried and nothing
/// is cached between calls.
pub struct RpcClient<C> {
    transport: C,
}

impl<C: RemoteCall> RpcClient<C> {
    pub fn new(transport: C) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    /// Perform a call and return its payload when the status is zero.
    pub fn invoke(
        &self,
        ctx: &MountContext,
        operation: &'static str,
        params: &[(&str, String)],
    ) -> FsResult<serde_json::Value> {
        debug!(operation, ?params, "Remote call");
        let reply = self
            .transport
            .invoke(ctx.token(), operation, params)
            .map_err(|e| {
                warn!(operation, error = %e, "Remote transport failed");
                FsError::remote(operation, RemoteFailure::Transport(e.0))
            })?;

        if reply.status != 0 {
            debug!(operation, status = reply.status, "Remote call refused");
            return Err(FsError::remote(
                operation,
                RemoteFailure::Status(reply.status),
            ));
        }
        Ok(reply.payload)
    }

    /// Perform a call whose reply carries no payload.
    pub fn invoke_unit(
        &self,
        ctx: &MountContext,
        operation: &'static str,
        params: &[(&str, String)],
    ) -> FsResult<()> {
        self.invoke(ctx, operation, params).map(|_| ())
    }

    fn invoke_decode<T: DeserializeOwned>(
        &self,
        ctx: &MountContext,
        operation: &'static str,
        params: &[(&str, String)],
    ) -> FsResult<T> {
        let payload = self.invoke(ctx, operation, params)?;
        serde_json::from_value(payload).map_err(|e| malformed(operation, e.to_string()))
    }

    /// `list`: entries of a directory, clipped to the page capacity.
    pub fn list(&self, ctx: &MountContext, inode: Inode) -> FsResult<EntriesPage> {
        let wire: WireEntries =
            self.invoke_decode(ctx, op::LIST, &[("inode", inode.to_string())])?;

        if wire.entries_count > wire.entries.len() {
            return Err(malformed(
                op::LIST,
                format!(
                    "entries_count {} but {} entries sent",
                    wire.entries_count,
                    wire.entries.len()
                ),
            ));
        }

        let entries = wire
            .entries
            .into_iter()
            .take(wire.entries_count)
            .map(|e| {
                let kind = entry_kind(op::LIST, e.entry_type)?;
                Ok(DirEntry::new(e.name.into_bytes(), e.ino, kind))
            })
            .collect::<FsResult<Vec<_>>>()?;

        let (page, dropped) = EntriesPage::clipped(entries);
        if dropped > 0 {
            warn!(
                inode,
                dropped, "Directory holds more entries than one page; extra entries unreachable"
            );
        }
        Ok(page)
    }

    /// `lookup`: what `name` (already encoded) refers to under `parent`.
    pub fn lookup(
        &self,
        ctx: &MountContext,
        parent: Inode,
        encoded_name: String,
    ) -> FsResult<EntryInfo> {
        let wire: WireEntryInfo = self.invoke_decode(
            ctx,
            op::LOOKUP,
            &[("parent", parent.to_string()), ("name", encoded_name)],
        )?;
        Ok(EntryInfo {
            kind: entry_kind(op::LOOKUP, wire.entry_type)?,
            inode: wire.ino,
        })
    }

    /// `create`: returns the inode the service assigned.
    pub fn create(
        &self,
        ctx: &MountContext,
        parent: Inode,
        kind: NodeKind,
        encoded_name: String,
    ) -> FsResult<Inode> {
        self.invoke_decode(
            ctx,
            op::CREATE,
            &[
                ("parent", parent.to_string()),
                ("type", kind.as_param().to_string()),
                ("name", encoded_name),
            ],
        )
    }

    /// `read`: the whole stored content of a file.
    pub fn read(&self, ctx: &MountContext, inode: Inode) -> FsResult<ContentBuffer> {
        let mut wire: WireContent =
            self.invoke_decode(ctx, op::READ, &[("inode", inode.to_string())])?;

        if wire.content_length > MAX_CONTENT {
            return Err(malformed(
                op::READ,
                format!(
                    "content_length {} exceeds capacity {}",
                    wire.content_length, MAX_CONTENT
                ),
            ));
        }
        if wire.content_length > wire.content.len() {
            return Err(malformed(
                op::READ,
                format!(
                    "content_length {} but {} bytes sent",
                    wire.content_length,
                    wire.content.len()
                ),
            ));
        }
        wire.content.truncate(wire.content_length);
        Ok(ContentBuffer::from_vec(wire.content))
    }
}

fn entry_kind(operation: &'static str, code: u8) -> FsResult<NodeKind> {
    NodeKind::from_code(code)
        .ok_or_else(|| malformed(operation, format!("unknown entry type {}", code)))
}

fn malformed(operation: &'static str, reason: String) -> FsError {
    warn!(operation, reason = %reason, "Malformed remote reply");
    FsError::remote(operation, RemoteFailure::Malformed(reason))
}
