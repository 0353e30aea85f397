//! `fuser` host binding for [`NetworkFs`].

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use fuser::consts::FOPEN_DIRECT_IO;
use fuser::{
    FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use tracing::{debug, warn};

use super::inode::{to_fuse, to_remote, InodeTable};
use crate::adapter::{NetworkFs, Node};
use crate::dir::IterateOutcome;
use crate::error::{FsError, FsResult};
use crate::mount::MountContext;
use crate::remote::RemoteCall;
use crate::types::{NodeKind, MAX_CONTENT};

/// Permission bits reported for every object; the service has no modes.
const PERMISSIONS: u16 = 0o777;

/// Block size reported to the kernel.
const BLOCK_SIZE: u32 = 512;

/// FUSE filesystem serving one mount of a remote tree.
pub struct NetworkFuse<C> {
    fs: NetworkFs<C>,
    ctx: Option<MountContext>,
    inodes: InodeTable,
    ttl: Duration,
    uid: u32,
    gid: u32,
}

impl<C: RemoteCall> NetworkFuse<C> {
    /// Serve `fs` for the mount described by `ctx`.
    ///
    /// The context is unmounted when the kernel tears the session down.
    pub fn new(fs: NetworkFs<C>, ctx: MountContext, ttl: Duration) -> Self {
        Self {
            fs,
            ctx: Some(ctx),
            inodes: InodeTable::new(),
            ttl,
            // SAFETY: getuid/getgid cannot fail and touch no memory.
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    fn ctx(&self) -> FsResult<&MountContext> {
        self.ctx
            .as_ref()
            .ok_or_else(|| FsError::InvalidToken("mount already released".to_string()))
    }

    /// Convert a node to FUSE attributes, asking the service for file size.
    fn attr(&self, node: Node) -> FsResult<FileAttr> {
        let size = match node {
            Node::File(_) => self.fs.content_len(self.ctx()?, node)? as u64,
            Node::Directory(_) => 0,
        };
        Ok(self.attr_with_size(node, size))
    }

    fn attr_with_size(&self, node: Node, size: u64) -> FileAttr {
        let kind = file_type(node.kind());
        FileAttr {
            ino: to_fuse(node.inode()),
            size,
            blocks: size.div_ceil(BLOCK_SIZE as u64),
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind,
            perm: PERMISSIONS,
            nlink: if kind == FileType::Directory { 2 } else { 1 },
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn lookup_node(&self, parent: u64, name: &OsStr) -> FsResult<Node> {
        let dir = self.inodes.node(parent)?;
        let node = self.fs.lookup_child(self.ctx()?, dir, name.as_bytes())?;
        self.inodes.remember(node, parent);
        Ok(node)
    }

    fn create_node(&self, parent: u64, name: &OsStr, kind: NodeKind) -> FsResult<FileAttr> {
        let dir = self.inodes.node(parent)?;
        let node = self
            .fs
            .create_child(self.ctx()?, dir, name.as_bytes(), kind)?;
        self.inodes.remember(node, parent);
        Ok(self.attr_with_size(node, 0))
    }

    fn remove_node(&self, parent: u64, name: &OsStr, kind: NodeKind) -> FsResult<()> {
        let dir = self.inodes.node(parent)?;
        self.fs
            .remove_child(self.ctx()?, dir, name.as_bytes(), kind)
    }

    fn link_node(&self, ino: u64, newparent: u64, newname: &OsStr) -> FsResult<FileAttr> {
        let source = self.inodes.node(ino)?;
        let dir = self.inodes.node(newparent)?;
        self.fs
            .link_child(self.ctx()?, source, dir, newname.as_bytes())?;
        self.inodes.remember(source, newparent);
        self.attr(source)
    }

    /// Feed entries of directory `ino` from `cursor` to `add`, which
    /// returns `true` once the host buffer is full.
    ///
    /// Listed entries are not remembered: the kernel looks up any entry it
    /// uses, and only looked-up inodes are ever forgotten.
    fn list_dir<F>(&self, ino: u64, cursor: u64, mut add: F) -> FsResult<IterateOutcome>
    where
        F: FnMut(u64, i64, FileType, &OsStr) -> bool,
    {
        let dir = self.inodes.node(ino)?;
        let parent = to_remote(self.inodes.parent_of(ino));
        self.fs
            .iterate_directory(self.ctx()?, dir, parent, cursor, |entry, next| {
                !add(
                    to_fuse(entry.inode),
                    next as i64,
                    file_type(entry.kind),
                    OsStr::from_bytes(&entry.name),
                )
            })
    }

    fn resize(&self, node: Node, size: u64) -> FsResult<()> {
        let ctx = self.ctx()?;
        if size == 0 {
            return self.fs.truncate_content(ctx, node);
        }
        if size > MAX_CONTENT as u64 {
            return Err(FsError::SizeLimitExceeded {
                offset: size,
                len: 0,
                capacity: MAX_CONTENT,
            });
        }
        let content = self.fs.content();
        let mut bytes = content.fetch(ctx, node.file()?)?.as_bytes().to_vec();
        bytes.resize(size as usize, 0);
        content.store(ctx, node.file()?, &bytes)
    }
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::File => FileType::RegularFile,
    }
}

/// Errno for a failed operation, logged on the way out.
fn errno(operation: &str, err: &FsError) -> i32 {
    debug!(operation, error = %err, "FUSE operation failed");
    err.errno()
}

impl<C: RemoteCall> Filesystem for NetworkFuse<C> {
    fn destroy(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.unmount();
        }
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.lookup_node(parent, name).and_then(|node| self.attr(node)) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            // Remote failures carry no reason; report absence.
            Err(e) if e.is_remote() => {
                debug!(parent, name = ?name, error = %e, "Lookup failed");
                reply.error(libc::ENOENT)
            }
            Err(e) => reply.error(errno("lookup", &e)),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, _nlookup: u64) {
        self.inodes.forget(ino);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        match self.inodes.node(ino).and_then(|node| self.attr(node)) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(e) => reply.error(errno("getattr", &e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<std::time::SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<std::time::SystemTime>,
        _chgtime: Option<std::time::SystemTime>,
        _bkuptime: Option<std::time::SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let result = self.inodes.node(ino).and_then(|node| {
            if let Some(size) = size {
                self.resize(node, size)?;
            }
            self.attr(node)
        });
        match result {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(e) => reply.error(errno("setattr", &e)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        match self.create_node(parent, name, NodeKind::Directory) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            Err(e) => reply.error(errno("mkdir", &e)),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.remove_node(parent, name, NodeKind::File) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(errno("unlink", &e)),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.remove_node(parent, name, NodeKind::Directory) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(errno("rmdir", &e)),
        }
    }

    fn link(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        match self.link_node(ino, newparent, newname) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            Err(e) => reply.error(errno("link", &e)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.inodes.node(ino).and_then(|node| node.file()) {
            // Every read must reach the service.
            Ok(_) => reply.opened(0, FOPEN_DIRECT_IO),
            Err(e) => reply.error(errno("open", &e)),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.inodes.node(ino).and_then(|node| node.dir()) {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(errno("opendir", &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let result = self.inodes.node(ino).and_then(|node| {
            self.fs
                .read_content(self.ctx()?, node, offset as u64, size as usize)
        });
        match result {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(errno("read", &e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let result = self.inodes.node(ino).and_then(|node| {
            self.fs
                .write_content(self.ctx()?, node, offset as u64, data)
        });
        match result {
            // A zero-length answer to a nonempty write makes the kernel
            // retry forever; report a full file instead.
            Ok(0) if !data.is_empty() => reply.error(libc::EFBIG),
            Ok(written) => reply.written(written as u32),
            Err(e) => reply.error(errno("write", &e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let result = self.list_dir(ino, offset.max(0) as u64, |child, next, kind, name| {
            reply.add(child, next, kind, name)
        });
        match result {
            Ok(outcome) => {
                debug!(ino, cursor = outcome.cursor, emitted = outcome.emitted, "readdir");
                reply.ok()
            }
            Err(e) => reply.error(errno("readdir", &e)),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        match self.create_node(parent, name, NodeKind::File) {
            Ok(attr) => reply.created(&self.ttl, &attr, 0, 0, FOPEN_DIRECT_IO),
            Err(e) => reply.error(errno("create", &e)),
        }
    }
}

fn mount_options() -> Vec<MountOption> {
    vec![
        MountOption::FSName("networkfs".to_string()),
        MountOption::Subtype("networkfs".to_string()),
        MountOption::NoAtime,
    ]
}

/// Mount and serve until the filesystem is unmounted.
///
/// # Arguments
/// * `fs` - The filesystem to serve
/// * `mountpoint` - Path to mount at
pub fn mount<C: RemoteCall + 'static>(fs: NetworkFuse<C>, mountpoint: &Path) -> FsResult<()> {
    fuser::mount2(fs, mountpoint, &mount_options()).map_err(|e| {
        warn!(mountpoint = %mountpoint.display(), error = %e, "Mount failed");
        FsError::MountFailed(e.to_string())
    })
}

/// Mount in a background thread.
///
/// Dropping the returned session unmounts the filesystem.
pub fn spawn_mount<C: RemoteCall + 'static>(
    fs: NetworkFuse<C>,
    mountpoint: &Path,
) -> FsResult<fuser::BackgroundSession> {
    fuser::spawn_mount2(fs, mountpoint, &mount_options()).map_err(|e| {
        warn!(mountpoint = %mountpoint.display(), error = %e, "Mount failed");
        FsError::MountFailed(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuse::inode::FUSE_ROOT_ID;
    use crate::remote::MemoryRemote;
    use crate::types::ROOT_INODE;
    use std::sync::Arc;

    fn fuse_fs() -> NetworkFuse<MemoryRemote> {
        NetworkFuse::new(
            NetworkFs::new(MemoryRemote::new()),
            MountContext::mount("tok").unwrap(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_root_attr() {
        let fs = fuse_fs();
        let attr = fs.attr(Node::Directory(ROOT_INODE)).unwrap();
        assert_eq!(attr.ino, 1);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, 0o777);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn test_create_then_lookup_through_table() {
        let fs = fuse_fs();
        let attr = fs
            .create_node(1, OsStr::new("notes"), NodeKind::File)
            .unwrap();
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(fs.inodes.parent_of(attr.ino), 1);

        let node = fs.lookup_node(1, OsStr::new("notes")).unwrap();
        assert_eq!(to_fuse(node.inode()), attr.ino);
    }

    #[test]
    fn test_file_size_comes_from_remote() {
        let fs = fuse_fs();
        let attr = fs
            .create_node(1, OsStr::new("f"), NodeKind::File)
            .unwrap();
        let node = fs.inodes.node(attr.ino).unwrap();
        fs.fs
            .write_content(fs.ctx().unwrap(), node, 0, b"hello")
            .unwrap();

        assert_eq!(fs.attr(node).unwrap().size, 5);
    }

    #[test]
    fn test_resize_shrinks_and_extends() {
        let fs = fuse_fs();
        let attr = fs
            .create_node(1, OsStr::new("f"), NodeKind::File)
            .unwrap();
        let node = fs.inodes.node(attr.ino).unwrap();
        let ctx = fs.ctx().unwrap();
        fs.fs.write_content(ctx, node, 0, b"hello").unwrap();

        fs.resize(node, 2).unwrap();
        assert_eq!(fs.fs.read_content(ctx, node, 0, 10).unwrap(), b"he");
        fs.resize(node, 4).unwrap();
        assert_eq!(fs.fs.read_content(ctx, node, 0, 10).unwrap(), b"he\0\0");
        fs.resize(node, 0).unwrap();
        assert!(fs.fs.read_content(ctx, node, 0, 10).unwrap().is_empty());
        assert!(fs.resize(node, 513).is_err());
    }

    #[test]
    fn test_link_records_new_parent() {
        let fs = fuse_fs();
        let dir = fs
            .create_node(1, OsStr::new("d"), NodeKind::Directory)
            .unwrap();
        let file = fs
            .create_node(1, OsStr::new("f"), NodeKind::File)
            .unwrap();

        let linked = fs.link_node(file.ino, dir.ino, OsStr::new("g")).unwrap();
        assert_eq!(linked.ino, file.ino);
        assert_eq!(fs.inodes.parent_of(file.ino), dir.ino);
    }

    #[test]
    fn test_listing_does_not_grow_inode_table() {
        let remote = Arc::new(MemoryRemote::new());
        let ctx = MountContext::mount("tok").unwrap();
        let direct = NetworkFs::new(remote.clone());
        direct
            .create_child(&ctx, direct.root(), b"a", NodeKind::File)
            .unwrap();
        direct
            .create_child(&ctx, direct.root(), b"b", NodeKind::Directory)
            .unwrap();

        let fs = NetworkFuse::new(NetworkFs::new(remote), ctx, Duration::from_secs(1));
        let mut seen = Vec::new();
        let outcome = fs
            .list_dir(FUSE_ROOT_ID, 0, |ino, next, kind, name| {
                seen.push((ino, next, kind, name.to_os_string()));
                false
            })
            .unwrap();

        assert_eq!(outcome.emitted, 4);
        assert_eq!(seen[0].0, FUSE_ROOT_ID);
        assert_eq!(seen[1].0, FUSE_ROOT_ID);
        assert_eq!(seen[2].3, OsStr::new("a"));
        assert_eq!(seen[3].2, FileType::Directory);
        assert_eq!(seen[3].1, 4);
        assert_eq!(fs.inodes.len(), 1);
    }

    #[test]
    fn test_listing_stops_when_buffer_is_full() {
        let fs = fuse_fs();
        fs.create_node(FUSE_ROOT_ID, OsStr::new("a"), NodeKind::File)
            .unwrap();

        let outcome = fs.list_dir(FUSE_ROOT_ID, 0, |_, next, _, _| next >= 2).unwrap();
        assert_eq!(outcome.emitted, 1);
        assert_eq!(outcome.cursor, 1);
    }

    #[test]
    fn test_destroy_releases_context() {
        let mut fs = fuse_fs();
        fs.destroy();
        assert!(fs.ctx().is_err());
    }
}
