//! CLI error type and exit handling.

use std::fmt;

use networkfs::config::ConfigError;
use networkfs::logging::LoggingError;
use networkfs::FsError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or argument problem.
    Config(String),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// A filesystem operation failed.
    Fs(FsError),
    /// The filesystem could not be mounted or served.
    Serve(FsError),
    /// Local I/O on stdin/stdout failed.
    Io(std::io::Error),
    /// A path argument named something that does not exist.
    NoSuchPath(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Fs(e) => write!(f, "{}", e),
            CliError::Serve(e) => write!(f, "Failed to serve filesystem: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::NoSuchPath(path) => write!(f, "{}: no such file or directory", path),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<FsError> for CliError {
    fn from(e: FsError) -> Self {
        CliError::Fs(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl CliError {
    /// Print the error and exit with a failure status.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(1);
    }
}
