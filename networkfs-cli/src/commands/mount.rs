//! Mount command - serve a remote tree through FUSE until interrupted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use networkfs::fuse::{spawn_mount, NetworkFuse};
use networkfs::remote::{MemoryRemote, RemoteCall};
use networkfs::NetworkFs;
use tracing::info;

use super::common::RemoteArgs;
use crate::error::CliError;
use crate::runner::{open_mount, CliRunner};

/// Arguments for the mount command.
pub struct MountArgs {
    pub token: String,
    pub mountpoint: PathBuf,
    pub memory: bool,
    pub attr_ttl: Option<u64>,
    pub remote: RemoteArgs,
    pub config: Option<PathBuf>,
}

/// Run the mount command.
pub fn run(args: MountArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.clone())?;
    runner.log_startup("mount");
    let config = runner.config();

    if !args.mountpoint.is_dir() {
        return Err(CliError::Config(format!(
            "Mountpoint {} is not a directory",
            args.mountpoint.display()
        )));
    }

    let ttl = Duration::from_secs(args.attr_ttl.unwrap_or(config.mount.attr_ttl));
    let options = runner.adapter_options(&args.remote);

    println!("NetworkFS v{}", networkfs::VERSION);
    println!("================");
    println!();
    println!("Mountpoint: {}", args.mountpoint.display());
    if args.memory {
        println!("Service:    in-memory (discarded on exit)");
    } else {
        println!(
            "Service:    {}",
            args.remote.url.as_deref().unwrap_or(&config.remote.url)
        );
    }
    println!("Oversize:   {}", options.oversize);
    println!();

    if args.memory {
        let remote = MemoryRemote::new().with_token(args.token.clone());
        serve(
            NetworkFs::with_options(remote, options),
            &args.token,
            &args.mountpoint,
            ttl,
        )
    } else {
        serve(runner.http_fs(&args.remote)?, &args.token, &args.mountpoint, ttl)
    }
}

fn serve<C: RemoteCall + 'static>(
    fs: NetworkFs<C>,
    token: &str,
    mountpoint: &Path,
    ttl: Duration,
) -> Result<(), CliError> {
    let ctx = open_mount(token)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, unmounting...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    // The session unmounts when dropped.
    let session =
        spawn_mount(NetworkFuse::new(fs, ctx, ttl), mountpoint).map_err(CliError::Serve)?;
    info!(mountpoint = %mountpoint.display(), "Filesystem mounted");
    println!("Press Ctrl+C to unmount and exit");

    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(session);
    info!("Filesystem unmounted");
    println!("Filesystem unmounted.");
    Ok(())
}
