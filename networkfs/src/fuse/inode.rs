//! Inode bookkeeping for the FUSE binding.
//!
//! FUSE reserves inode 1 for the mount root while the service roots its
//! tree at [`ROOT_INODE`]. The two numbers are swapped so the mapping stays
//! a bijection even if the service ever hands out inode 1.

use dashmap::DashMap;

use crate::adapter::Node;
use crate::error::{FsError, FsResult};
use crate::types::{Inode, ROOT_INODE};

/// Inode FUSE uses for the mount root.
pub const FUSE_ROOT_ID: u64 = 1;

/// Translate a service inode into a FUSE inode.
pub fn to_fuse(remote: Inode) -> u64 {
    match remote {
        ROOT_INODE => FUSE_ROOT_ID,
        FUSE_ROOT_ID => ROOT_INODE,
        other => other,
    }
}

/// Translate a FUSE inode into a service inode.
pub fn to_remote(fuse: u64) -> Inode {
    // The swap is its own inverse.
    to_fuse(fuse)
}

/// What the host knows about one inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownInode {
    pub node: Node,
    /// FUSE inode of the directory it was last seen in.
    pub parent: u64,
}

/// Nodes learned from lookups, creations and listings, keyed by FUSE inode.
///
/// The table only records kinds and parents so `..` and type dispatch work;
/// it never stands in for remote content.
pub struct InodeTable {
    entries: DashMap<u64, KnownInode>,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Table that knows only the root.
    pub fn new() -> Self {
        let entries = DashMap::new();
        entries.insert(
            FUSE_ROOT_ID,
            KnownInode {
                node: Node::Directory(ROOT_INODE),
                parent: FUSE_ROOT_ID,
            },
        );
        Self { entries }
    }

    /// Record `node` as seen inside directory `parent` (FUSE inode).
    ///
    /// Returns the FUSE inode for `node`.
    pub fn remember(&self, node: Node, parent: u64) -> u64 {
        let ino = to_fuse(node.inode());
        if ino != FUSE_ROOT_ID {
            self.entries.insert(ino, KnownInode { node, parent });
        }
        ino
    }

    pub fn get(&self, ino: u64) -> FsResult<KnownInode> {
        self.entries
            .get(&ino)
            .map(|e| *e.value())
            .ok_or(FsError::NotFound(ino))
    }

    pub fn node(&self, ino: u64) -> FsResult<Node> {
        self.get(ino).map(|known| known.node)
    }

    /// FUSE inode of the parent of `ino`; the root is its own parent.
    pub fn parent_of(&self, ino: u64) -> u64 {
        self.entries
            .get(&ino)
            .map(|e| e.parent)
            .unwrap_or(FUSE_ROOT_ID)
    }

    /// Drop an inode the service no longer names.
    pub fn forget(&self, ino: u64) {
        if ino != FUSE_ROOT_ID {
            self.entries.remove(&ino);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
