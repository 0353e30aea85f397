//! NetworkFS CLI - mount and inspect a remote directory/content service
//!
//! `networkfs mount` serves the tree through FUSE; `ls`, `cat` and `write`
//! perform one-shot operations without mounting.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cat::CatArgs;
use commands::common::RemoteArgs;
use commands::ls::LsArgs;
use commands::mount::MountArgs;
use commands::write::WriteArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "networkfs", version, about)]
struct Cli {
    /// Configuration file (defaults to ~/.config/networkfs/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Mount the remote tree and serve it until Ctrl+C
    Mount {
        /// Access token naming the remote tree
        token: String,

        /// Empty directory to mount at
        mountpoint: PathBuf,

        /// Serve a fresh in-memory tree instead of the HTTP service
        #[arg(long)]
        memory: bool,

        /// Attribute cache TTL in seconds
        #[arg(long)]
        attr_ttl: Option<u64>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// List a remote directory
    Ls {
        token: String,

        #[arg(default_value = "/")]
        path: String,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Print a remote file
    Cat {
        token: String,
        path: String,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Store stdin into a remote file
    Write {
        token: String,
        path: String,

        /// Byte offset to write at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Create the file if it does not exist
        #[arg(long)]
        create: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config;
    match cli.command {
        Commands::Init { force } => commands::init::run(config, force),
        Commands::Mount {
            token,
            mountpoint,
            memory,
            attr_ttl,
            remote,
        } => commands::mount::run(MountArgs {
            token,
            mountpoint,
            memory,
            attr_ttl,
            remote,
            config,
        }),
        Commands::Ls {
            token,
            path,
            remote,
        } => commands::ls::run(LsArgs {
            token,
            path,
            remote,
            config,
        }),
        Commands::Cat {
            token,
            path,
            remote,
        } => commands::cat::run(CatArgs {
            token,
            path,
            remote,
            config,
        }),
        Commands::Write {
            token,
            path,
            offset,
            create,
            remote,
        } => commands::write::run(WriteArgs {
            token,
            path,
            offset,
            create,
            remote,
            config,
        }),
    }
}
