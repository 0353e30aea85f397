//! Cat command - print a remote file's content.

use std::io::Write;
use std::path::PathBuf;

use networkfs::remote::RemoteCall;
use networkfs::{MountContext, NetworkFs, MAX_CONTENT};

use super::common::{resolve, RemoteArgs};
use crate::error::CliError;
use crate::runner::{open_mount, CliRunner};

/// Arguments for the cat command.
pub struct CatArgs {
    pub token: String,
    pub path: String,
    pub remote: RemoteArgs,
    pub config: Option<PathBuf>,
}

/// Run the cat command.
pub fn run(args: CatArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config)?;
    runner.log_startup("cat");
    let fs = runner.http_fs(&args.remote)?;
    let ctx = open_mount(&args.token)?;

    let content = fetch(&fs, &ctx, &args.path);
    ctx.unmount();

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content?)?;
    stdout.flush()?;
    Ok(())
}

/// Whole content of the file at `path`.
pub fn fetch<C: RemoteCall>(
    fs: &NetworkFs<C>,
    ctx: &MountContext,
    path: &str,
) -> Result<Vec<u8>, CliError> {
    let resolved = resolve(fs, ctx, path)?;
    Ok(fs.read_content(ctx, resolved.node, 0, MAX_CONTENT)?)
}
