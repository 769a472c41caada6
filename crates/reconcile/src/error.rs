//! Error types for reconciliation.
//!
//! Errors fall into two groups. Declaration errors (unknown principals,
//! invalid modes, conflicting targets) are raised while a desired state is
//! being built and make that single declaration unusable. Run errors
//! (duplicate destinations, failed commands) decide whether the remaining
//! pipeline may continue.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the reconciliation core.
#[derive(Debug, Error)]
pub enum Error {
    /// The declared owner does not exist on this host
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The declared group does not exist on this host
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// The declared mode is not a valid octal permission value
    #[error("invalid mode '{mode}': expected octal permission bits")]
    InvalidMode {
        /// The rejected mode text
        mode: String,
    },

    /// A declaration asked for both a copied file and a symlink
    #[error("'{0}' cannot be both a copied file and a symlink")]
    LinkAndCopy(PathBuf),

    /// Two declarations target the same destination
    #[error("duplicate definition for '{}': '{}' and '{}'", destination.display(), first.display(), second.display())]
    DuplicateDestination {
        /// The contested destination path
        destination: PathBuf,
        /// Source of the declaration seen first
        first: PathBuf,
        /// Source of the conflicting declaration
        second: PathBuf,
    },

    /// A command could not be started
    #[error("cannot run '{command}': {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// A command ran and exited unsuccessfully
    #[error("'{command}' exited with {}", code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
}

impl Error {
    /// Whether the failure is the command itself being absent.
    ///
    /// This is the path-resolution case (the executable does not exist), as
    /// opposed to the command running and rejecting its input.
    pub fn is_command_not_found(&self) -> bool {
        matches!(self, Error::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
