//! Write command - store stdin into a remote file.

use std::io::Read;
use std::path::PathBuf;

use networkfs::remote::RemoteCall;
use networkfs::{MountContext, NetworkFs, NodeKind, MAX_CONTENT};

use super::common::{resolve, split_last, RemoteArgs};
use crate::error::CliError;
use crate::runner::{open_mount, CliRunner};

/// Arguments for the write command.
pub struct WriteArgs {
    pub token: String,
    pub path: String,
    pub offset: u64,
    pub create: bool,
    pub remote: RemoteArgs,
    pub config: Option<PathBuf>,
}

/// Run the write command.
pub fn run(args: WriteArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.clone())?;
    runner.log_startup("write");
    let fs = runner.http_fs(&args.remote)?;

    // One byte past the limit is enough for the policy to see an oversize write.
    let mut data = Vec::new();
    std::io::stdin()
        .take(MAX_CONTENT as u64 + 1)
        .read_to_end(&mut data)?;

    let ctx = open_mount(&args.token)?;
    let written = store(&fs, &ctx, &args.path, args.offset, &data, args.create);
    ctx.unmount();

    let written = written?;
    if written < data.len() {
        eprintln!(
            "Stored {} of {} bytes (content is limited to {} bytes)",
            written,
            data.len(),
            MAX_CONTENT
        );
    }
    Ok(())
}

/// Write `data` into the file at `path`, creating it first when asked.
pub fn store<C: RemoteCall>(
    fs: &NetworkFs<C>,
    ctx: &MountContext,
    path: &str,
    offset: u64,
    data: &[u8],
    create: bool,
) -> Result<usize, CliError> {
    let node = match resolve(fs, ctx, path) {
        Ok(resolved) => resolved.node,
        Err(CliError::NoSuchPath(_)) if create => {
            let (dir, name) =
                split_last(path).ok_or_else(|| CliError::NoSuchPath(path.to_string()))?;
            let parent = resolve(fs, ctx, &dir)?.node;
            fs.create_child(ctx, parent, name.as_bytes(), NodeKind::File)?
        }
        Err(e) => return Err(e),
    };
    Ok(fs.write_content(ctx, node, offset, data)?)
}
