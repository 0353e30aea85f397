//! Inode-keyed interface for host integration layers.
//!
//! A host asks for operations by inode number and supplies the live
//! [`MountContext`]. Each inode it knows about is held as a [`Node`], chosen
//! once from the kind the service reported: directories support naming
//! operations and iteration, files support content access.

use tracing::instrument;

use crate::content::{ContentAccessor, OversizePolicy};
use crate::dir::{DirectoryIterator, IterateOutcome};
use crate::error::{FsError, FsResult};
use crate::mount::MountContext;
use crate::remote::{RemoteCall, RpcClient};
use crate::resolver::EntryResolver;
use crate::types::{DirEntry, EntryInfo, Inode, NodeKind, ROOT_INODE};

/// Host-side representation of one remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Directory(Inode),
    File(Inode),
}

impl Node {
    pub fn new(inode: Inode, kind: NodeKind) -> Self {
        match kind {
            NodeKind::Directory => Node::Directory(inode),
            NodeKind::File => Node::File(inode),
        }
    }

    pub fn inode(&self) -> Inode {
        match self {
            Node::Directory(ino) | Node::File(ino) => *ino,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Directory(_) => NodeKind::Directory,
            Node::File(_) => NodeKind::File,
        }
    }

    /// Inode of a directory node, or `NotADirectory`.
    pub fn dir(&self) -> FsResult<Inode> {
        match self {
            Node::Directory(ino) => Ok(*ino),
            Node::File(ino) => Err(FsError::NotADirectory(*ino)),
        }
    }

    /// Inode of a file node, or `IsADirectory`.
    pub fn file(&self) -> FsResult<Inode> {
        match self {
            Node::File(ino) => Ok(*ino),
            Node::Directory(ino) => Err(FsError::IsADirectory(*ino)),
        }
    }
}

impl From<EntryInfo> for Node {
    fn from(info: EntryInfo) -> Self {
        Node::new(info.inode, info.kind)
    }
}

impl From<&DirEntry> for Node {
    fn from(entry: &DirEntry) -> Self {
        Node::new(entry.inode, entry.kind)
    }
}

/// Options for a [`NetworkFs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterOptions {
    pub oversize: OversizePolicy,
}

/// Remote-backed filesystem adapter.
///
/// Stateless apart from the transport: every call performs its remote
/// requests and returns. Serializing conflicting calls is up to the host.
pub struct NetworkFs<C> {
    client: RpcClient<C>,
    options: AdapterOptions,
}

impl<C: RemoteCall> NetworkFs<C> {
    pub fn new(transport: C) -> Self {
        Self::with_options(transport, AdapterOptions::default())
    }

    pub fn with_options(transport: C, options: AdapterOptions) -> Self {
        Self {
            client: RpcClient::new(transport),
            options,
        }
    }

    pub fn client(&self) -> &RpcClient<C> {
        &self.client
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// The root directory of every mount.
    pub fn root(&self) -> Node {
        Node::Directory(ROOT_INODE)
    }

    pub fn resolver(&self) -> EntryResolver<'_, C> {
        EntryResolver::new(&self.client)
    }

    pub fn iterator(&self) -> DirectoryIterator<'_, C> {
        DirectoryIterator::new(self.resolver())
    }

    pub fn content(&self) -> ContentAccessor<'_, C> {
        ContentAccessor::new(&self.client, self.options.oversize)
    }

    /// Resolve `name` inside `parent`.
    #[instrument(level = "debug", skip(self, ctx, name), fields(name = %String::from_utf8_lossy(name)))]
    pub fn lookup_child(&self, ctx: &MountContext, parent: Node, name: &[u8]) -> FsResult<Node> {
        let info = self.resolver().lookup(ctx, parent.dir()?, name)?;
        Ok(info.into())
    }

    /// Create a file or directory inside `parent`.
    #[instrument(level = "debug", skip(self, ctx, name), fields(name = %String::from_utf8_lossy(name)))]
    pub fn create_child(
        &self,
        ctx: &MountContext,
        parent: Node,
        name: &[u8],
        kind: NodeKind,
    ) -> FsResult<Node> {
        let inode = self.resolver().create(ctx, parent.dir()?, name, kind)?;
        Ok(Node::new(inode, kind))
    }

    /// Remove a file (`unlink`) or an empty directory (`rmdir`).
    #[instrument(level = "debug", skip(self, ctx, name), fields(name = %String::from_utf8_lossy(name)))]
    pub fn remove_child(
        &self,
        ctx: &MountContext,
        parent: Node,
        name: &[u8],
        kind: NodeKind,
    ) -> FsResult<()> {
        self.resolver().remove_kind(ctx, parent.dir()?, name, kind)
    }

    /// Add `name` inside `parent` for the existing `source`.
    #[instrument(level = "debug", skip(self, ctx, name), fields(name = %String::from_utf8_lossy(name)))]
    pub fn link_child(
        &self,
        ctx: &MountContext,
        source: Node,
        parent: Node,
        name: &[u8],
    ) -> FsResult<()> {
        self.resolver()
            .link(ctx, source.inode(), parent.dir()?, name)
    }

    /// Emit entries of `dir` from `cursor`; see [`DirectoryIterator::iterate`].
    pub fn iterate_directory<F>(
        &self,
        ctx: &MountContext,
        dir: Node,
        parent: Inode,
        cursor: u64,
        sink: F,
    ) -> FsResult<IterateOutcome>
    where
        F: FnMut(&DirEntry, u64) -> bool,
    {
        self.iterator().iterate(ctx, dir.dir()?, parent, cursor, sink)
    }

    /// Read up to `length` bytes of `file` at `offset`.
    pub fn read_content(
        &self,
        ctx: &MountContext,
        file: Node,
        offset: u64,
        length: usize,
    ) -> FsResult<Vec<u8>> {
        self.content().read(ctx, file.file()?, offset, length)
    }

    /// Write `bytes` into `file` at `offset`; returns the bytes stored.
    pub fn write_content(
        &self,
        ctx: &MountContext,
        file: Node,
        offset: u64,
        bytes: &[u8],
    ) -> FsResult<usize> {
        self.content().write(ctx, file.file()?, offset, bytes)
    }

    /// Current stored length of `file`.
    pub fn content_len(&self, ctx: &MountContext, file: Node) -> FsResult<usize> {
        Ok(self.content().fetch(ctx, file.file()?)?.len())
    }

    /// Drop all content of `file`.
    pub fn truncate_content(&self, ctx: &MountContext, file: Node) -> FsResult<()> {
        self.content().truncate(ctx, file.file()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::MockRemote;
    use serde_json::json;

    fn ctx() -> MountContext {
        MountContext::mount("tok").unwrap()
    }

    #[test]
    fn test_node_from_kind() {
        assert_eq!(Node::new(5, NodeKind::File), Node::File(5));
        assert_eq!(Node::new(6, NodeKind::Directory), Node::Directory(6));
        assert_eq!(Node::File(5).kind(), NodeKind::File);
        assert_eq!(Node::Directory(6).inode(), 6);
    }

    #[test]
    fn test_root_is_directory() {
        let fs = NetworkFs::new(MockRemote::new());
        assert_eq!(fs.root(), Node::Directory(1000));
    }

    #[test]
    fn test_lookup_in_file_is_rejected_locally() {
        let fs = NetworkFs::new(MockRemote::new());
        let err = fs.lookup_child(&ctx(), Node::File(1001), b"x").unwrap_err();
        assert_eq!(err, FsError::NotADirectory(1001));
        assert!(fs.client().transport().calls().is_empty());
    }

    #[test]
    fn test_read_directory_is_rejected_locally() {
        let fs = NetworkFs::new(MockRemote::new());
        let err = fs
            .read_content(&ctx(), Node::Directory(1000), 0, 10)
            .unwrap_err();
        assert_eq!(err, FsError::IsADirectory(1000));
    }

    #[test]
    fn test_iterate_file_is_rejected() {
        let fs = NetworkFs::new(MockRemote::new());
        let err = fs
            .iterate_directory(&ctx(), Node::File(1001), 1000, 0, |_, _| true)
            .unwrap_err();
        assert_eq!(err, FsError::NotADirectory(1001));
    }

    #[test]
    fn test_lookup_child_builds_node() {
        let fs = NetworkFs::new(MockRemote::new());
        fs.client()
            .transport()
            .push_ok(json!({"entry_type": 4, "ino": 1007}));

        let node = fs.lookup_child(&ctx(), fs.root(), b"sub").unwrap();
        assert_eq!(node, Node::Directory(1007));
    }

    #[test]
    fn test_create_child_uses_requested_kind() {
        let fs = NetworkFs::new(MockRemote::new());
        fs.client().transport().push_ok(json!(1008));

        let node = fs
            .create_child(&ctx(), fs.root(), b"f", NodeKind::File)
            .unwrap();
        assert_eq!(node, Node::File(1008));
    }

    #[test]
    fn test_reject_policy_is_applied() {
        let fs = NetworkFs::with_options(
            MockRemote::new(),
            AdapterOptions {
                oversize: OversizePolicy::Reject,
            },
        );
        let err = fs
            .write_content(&ctx(), Node::File(1001), 0, &[1u8; 600])
            .unwrap_err();
        assert!(matches!(err, FsError::SizeLimitExceeded { .. }));
    }
}
