//! Error types for package backend selection.

use thiserror::Error;

/// Errors that can occur while selecting a package backend.
#[derive(Debug, Error)]
pub enum Error {
    /// None of the known package manager executables is on PATH
    #[error("no supported package manager found (looked for: {searched})")]
    NoBackend {
        /// Executables that were probed, in order
        searched: String,
    },
}

/// Result type for package backend operations.
pub type Result<T> = std::result::Result<T, Error>;
