//! Mount context: the authentication token for one mounted instance.

use std::fmt;

use tracing::info;

use crate::error::{FsError, FsResult};

/// State of one active mount.
///
/// Created only by [`MountContext::mount`] and released by
/// [`MountContext::unmount`], which consumes it. Operations borrow it;
/// there is no process-wide copy.
pub struct MountContext {
    token: String,
}

impl MountContext {
    /// Start a mount with the given service token.
    pub fn mount(token: impl Into<String>) -> FsResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(FsError::InvalidToken("token is empty".to_string()));
        }
        if token.contains(['/', '?', '&', '#']) || token.chars().any(char::is_whitespace) {
            return Err(FsError::InvalidToken(
                "token contains URL-reserved characters".to_string(),
            ));
        }
        info!(token = %redact(&token), "Mounted");
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// End the mount and release the token.
    pub fn unmount(self) {
        info!(token = %redact(&self.token), "Unmounted");
    }
}

impl fmt::Debug for MountContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountContext")
            .field("token", &redact(&self.token))
            .finish()
    }
}

/// Keep only a short prefix of the token for logs.
fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}…", prefix)
}
