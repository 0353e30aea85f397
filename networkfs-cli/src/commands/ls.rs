//! Ls command - list a remote directory.

use std::path::PathBuf;

use networkfs::remote::RemoteCall;
use networkfs::{DirEntry, MountContext, NetworkFs};

use super::common::{resolve, RemoteArgs};
use crate::error::CliError;
use crate::runner::{open_mount, CliRunner};

/// Arguments for the ls command.
pub struct LsArgs {
    pub token: String,
    pub path: String,
    pub remote: RemoteArgs,
    pub config: Option<PathBuf>,
}

/// Run the ls command.
pub fn run(args: LsArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config)?;
    runner.log_startup("ls");
    let fs = runner.http_fs(&args.remote)?;
    let ctx = open_mount(&args.token)?;

    let entries = list(&fs, &ctx, &args.path);
    ctx.unmount();

    for line in entries?.iter().map(format_entry) {
        println!("{}", line);
    }
    Ok(())
}

/// All entries of the directory at `path`, `.` and `..` included.
pub fn list<C: RemoteCall>(
    fs: &NetworkFs<C>,
    ctx: &MountContext,
    path: &str,
) -> Result<Vec<DirEntry>, CliError> {
    let resolved = resolve(fs, ctx, path)?;
    let entries = fs
        .iterator()
        .collect_all(ctx, resolved.node.dir()?, resolved.parent)?;
    Ok(entries)
}

/// One listing line: kind, inode, name.
pub fn format_entry(entry: &DirEntry) -> String {
    format!(
        "{:<9} {:>8}  {}",
        entry.kind.to_string(),
        entry.inode,
        entry.name_lossy()
    )
}
