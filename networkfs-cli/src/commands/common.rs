//! Common types and utilities shared across CLI commands.

use clap::{Args, ValueEnum};
use networkfs::remote::RemoteCall;
use networkfs::{MountContext, NetworkFs, Node, OversizePolicy};

use crate::error::CliError;

/// Oversize write policy selection for CLI arguments.
#[derive(Debug, Clone, ValueEnum, PartialEq)]
pub enum OversizeArg {
    /// Store the first 512 bytes and report the shortened count
    Truncate,
    /// Fail the whole write
    Reject,
}

impl From<OversizeArg> for OversizePolicy {
    fn from(arg: OversizeArg) -> Self {
        match arg {
            OversizeArg::Truncate => OversizePolicy::Truncate,
            OversizeArg::Reject => OversizePolicy::Reject,
        }
    }
}

/// Service connection overrides; unset values come from config.ini.
#[derive(Debug, Clone, Default, Args)]
pub struct RemoteArgs {
    /// Service base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// What to do with writes past the 512-byte content limit
    #[arg(long, value_enum)]
    pub oversize: Option<OversizeArg>,
}

/// A path resolved against the remote tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub node: Node,
    /// Inode of the containing directory; the root is its own parent.
    pub parent: u64,
}

/// Split `path` into its non-empty components.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".")
}

/// Split `path` into its parent directory path and final name.
pub fn split_last(path: &str) -> Option<(String, &str)> {
    let parts: Vec<&str> = components(path).collect();
    let (last, dirs) = parts.split_last()?;
    Some((dirs.join("/"), last))
}

/// Walk `path` from the root one lookup per component.
pub fn resolve<C: RemoteCall>(
    fs: &NetworkFs<C>,
    ctx: &MountContext,
    path: &str,
) -> Result<Resolved, CliError> {
    let root = fs.root();
    let mut current = Resolved {
        node: root,
        parent: root.inode(),
    };
    for component in components(path) {
        let node = fs
            .lookup_child(ctx, current.node, component.as_bytes())
            .map_err(|e| match e {
                e if e.is_remote() => CliError::NoSuchPath(path.to_string()),
                e => CliError::Fs(e),
            })?;
        current = Resolved {
            node,
            parent: current.node.inode(),
        };
    }
    Ok(current)
}
