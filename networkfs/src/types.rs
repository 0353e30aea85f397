//! Value types exchanged with the remote directory/content service.
//!
//! Nothing here is cached: pages and buffers are transient results of one
//! remote call.

use std::fmt;

use serde::Deserialize;

/// Inode number as assigned by the remote service.
pub type Inode = u64;

/// Well-known inode of the remote root directory.
pub const ROOT_INODE: Inode = 1000;

/// Maximum number of entries one `list` call returns.
pub const MAX_ENTRIES: usize = 16;

/// Maximum stored size of one file, in bytes.
pub const MAX_CONTENT: usize = 512;

/// Longest entry name accepted by the service, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Wire code for a directory entry.
const DT_DIR: u8 = 4;
/// Wire code for a regular file entry.
const DT_REG: u8 = 8;

/// Kind of a remote filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Directory,
    File,
}

impl NodeKind {
    /// Value of the `type` parameter on `create`.
    pub fn as_param(&self) -> &'static str {
        match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
        }
    }

    /// Decode the service's entry type code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            DT_DIR => Some(NodeKind::Directory),
            DT_REG => Some(NodeKind::File),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            NodeKind::Directory => DT_DIR,
            NodeKind::File => DT_REG,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Result of a `lookup`: what the name points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub kind: NodeKind,
    pub inode: Inode,
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Raw name bytes; not guaranteed to be UTF-8.
    pub name: Vec<u8>,
    pub inode: Inode,
    pub kind: NodeKind,
}

impl DirEntry {
    pub fn new(name: impl Into<Vec<u8>>, inode: Inode, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            inode,
            kind,
        }
    }

    /// Name for display, lossy for non-UTF-8 bytes.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// Entries returned by one `list` call, at most [`MAX_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntriesPage {
    entries: Vec<DirEntry>,
}

impl EntriesPage {
    /// Build a page, keeping only the first [`MAX_ENTRIES`] entries.
    ///
    /// Returns the page and the number of entries dropped.
    pub fn clipped(mut entries: Vec<DirEntry>) -> (Self, usize) {
        let dropped = entries.len().saturating_sub(MAX_ENTRIES);
        entries.truncate(MAX_ENTRIES);
        (Self { entries }, dropped)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index)
    }
}

/// Complete content of one file, at most [`MAX_CONTENT`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBuffer {
    bytes: Vec<u8>,
}

impl ContentBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap bytes that are already known to fit.
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() <= MAX_CONTENT);
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

// Wire shapes of the service payloads. Kept private; the client converts
// them into the types above after validation.

#[derive(Debug, Deserialize)]
pub(crate) struct WireEntry {
    pub entry_type: u8,
    pub ino: Inode,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEntries {
    pub entries_count: usize,
    pub entries: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEntryInfo {
    pub entry_type: u8,
    pub ino: Inode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireContent {
    pub content_length: usize,
    pub content: Vec<u8>,
}
