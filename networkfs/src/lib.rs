//! NetworkFS - a filesystem whose tree lives on a remote HTTP service
//!
//! Every operation is forwarded to the service and nothing is cached
//! locally. Names and content travel `%xx`-encoded in query parameters;
//! directories hold at most [`MAX_ENTRIES`] entries and files at most
//! [`MAX_CONTENT`] bytes.
//!
//! The crate is layered:
//!
//! - [`remote`] issues the eight service calls over a pluggable transport
//! - [`resolver`], [`dir`] and [`content`] build the filesystem semantics
//! - [`adapter`] exposes them by inode for a host
//! - [`fuse`] is the host binding used by the `networkfs` binary

pub mod adapter;
pub mod config;
pub mod content;
pub mod dir;
pub mod error;
pub mod fuse;
pub mod logging;
pub mod mount;
pub mod name;
pub mod remote;
pub mod resolver;
pub mod types;

pub use adapter::{AdapterOptions, NetworkFs, Node};
pub use content::OversizePolicy;
pub use dir::IterateOutcome;
pub use error::{FsError, FsResult, RemoteFailure};
pub use mount::MountContext;
pub use types::{
    ContentBuffer, DirEntry, EntriesPage, EntryInfo, Inode, NodeKind, MAX_CONTENT, MAX_ENTRIES,
    MAX_NAME_LEN, ROOT_INODE,
};

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
