//! Command implementations
//!
//! Every command shares the same front half of the pipeline: scan the
//! configuration directory, enforce global constraints, pick the host's
//! package backend, then drop declarations failing local constraints.

pub mod apply;
pub mod check;

use anyhow::{Context as _, Result};
use reconcile::{CommandRunner, DesiredFile, PackageBackend};
use std::path::PathBuf;
use std::sync::Arc;

use crate::paths;
use crate::scanner;

/// Declarations that passed validation
pub struct Validated {
    pub conf_dir: PathBuf,
    pub files: Vec<Arc<DesiredFile>>,
    /// Declarations dropped by local validation
    pub rejected: usize,
    pub backend: Box<dyn PackageBackend>,
}

/// Scan and validate the configuration directory
pub fn validate(
    conf_dir: Option<&str>,
    runner: &Arc<dyn CommandRunner>,
    allow_missing_pre: bool,
) -> Result<Validated> {
    let conf_dir = paths::config_dir(conf_dir)?;

    log::debug!("configuration parsing starts");
    let files = scanner::parse_files(&conf_dir)
        .with_context(|| format!("Failed to parse {}", conf_dir.display()))?;
    log::debug!("configuration parsing ends: {} declarations", files.len());

    reconcile::check_global_constraints(&files).context("Global validation failed")?;

    let backend = pkgkit::system_backend(Arc::clone(runner))?;
    log::debug!("using {} package backend", backend.name());

    let declared = files.len();
    let files = reconcile::check_local_constraints(
        files,
        backend.as_ref(),
        runner.as_ref(),
        allow_missing_pre,
    );

    Ok(Validated {
        conf_dir,
        rejected: declared - files.len(),
        files,
        backend,
    })
}
