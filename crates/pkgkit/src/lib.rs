//! # pkgkit
//!
//! Distribution package manager backends.
//!
//! This crate provides:
//! - One [`reconcile::PackageBackend`] per package manager family (APT,
//!   YUM/RPM, APK, Pacman and the Yay AUR helper)
//! - Host detection by executable lookup, computed once per process
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::system_backend;
//! use reconcile::SystemRunner;
//! use std::sync::Arc;
//!
//! let backend = system_backend(Arc::new(SystemRunner)).expect("no package manager");
//! if !backend.is_installed("vim") {
//!     println!("{}", backend.install_command().arg("vim"));
//! }
//! ```

#![warn(missing_docs)]

#[allow(missing_docs)]
pub mod backend;
pub mod error;

pub use backend::{BackendKind, backend_for, detect, detect_with};
pub use error::{Error, Result};

use reconcile::{CommandRunner, PackageBackend};
use std::sync::Arc;

/// Backend for the package manager found on this host.
///
/// Fails if none of the known package managers is installed.
pub fn system_backend(runner: Arc<dyn CommandRunner>) -> Result<Box<dyn PackageBackend>> {
    let kind = detect().ok_or_else(|| Error::NoBackend {
        searched: backend::probed_executables(),
    })?;
    Ok(backend_for(kind, runner))
}
