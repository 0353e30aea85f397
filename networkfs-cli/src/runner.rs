//! Shared setup for commands that talk to the service.

use std::path::PathBuf;

use networkfs::config::{default_config_path, ConfigFile};
use networkfs::logging::{self, WorkerGuard};
use networkfs::remote::HttpTransport;
use networkfs::{AdapterOptions, MountContext, NetworkFs};
use tracing::info;

use crate::commands::common::RemoteArgs;
use crate::error::CliError;

/// Loaded configuration plus the logging guard for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    // Held so the file writer flushes on exit.
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load configuration from `config_path` (or the default location) and
    /// install logging.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let config = ConfigFile::load(&config_path)?;
        let guard = logging::init(&config.logging)?;

        Ok(Self {
            config,
            config_path,
            _log_guard: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = networkfs::VERSION,
            command,
            config = %self.config_path.display(),
            "NetworkFS starting"
        );
    }

    /// Adapter options with CLI overrides applied.
    pub fn adapter_options(&self, remote: &RemoteArgs) -> AdapterOptions {
        AdapterOptions {
            oversize: remote
                .oversize
                .clone()
                .map(Into::into)
                .unwrap_or(self.config.mount.oversize_writes),
        }
    }

    /// HTTP-backed adapter with CLI overrides applied.
    pub fn http_fs(&self, remote: &RemoteArgs) -> Result<NetworkFs<HttpTransport>, CliError> {
        let url = remote
            .url
            .clone()
            .unwrap_or_else(|| self.config.remote.url.clone());
        let timeout = remote.timeout.unwrap_or(self.config.remote.timeout);
        let transport = HttpTransport::with_timeout(url, timeout)
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(NetworkFs::with_options(
            transport,
            self.adapter_options(remote),
        ))
    }
}

/// Begin a mount for `token`.
pub fn open_mount(token: &str) -> Result<MountContext, CliError> {
    Ok(MountContext::mount(token)?)
}
