//! Init command - write a configuration file with default settings.

use std::path::{Path, PathBuf};

use networkfs::config::{default_config_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(config: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = match config {
        Some(path) => path,
        None => default_config_path()?,
    };

    if write_defaults(&path, force)? {
        println!("Configuration file: {}", path.display());
        println!();
        println!("Edit this file to customize NetworkFS settings.");
        println!("CLI arguments override config file values when specified.");
    } else {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }
    Ok(())
}

/// Write the default configuration unless a file exists and `force` is off.
///
/// Returns whether a file was written.
pub fn write_defaults(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    ConfigFile::default().save(path)?;
    Ok(true)
}
