//! FUSE host binding.
//!
//! Serves a [`NetworkFs`](crate::NetworkFs) through the kernel's FUSE
//! interface. The binding owns the mount context for the lifetime of the
//! session and keeps the inode table the adapter itself does without.

mod filesystem;
pub mod inode;

pub use filesystem::{mount, spawn_mount, NetworkFuse};
pub use inode::{InodeTable, KnownInode, FUSE_ROOT_ID};
