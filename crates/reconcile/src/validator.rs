//! Declaration validator
//!
//! Global constraints must hold across every declaration; a violation stops
//! the whole run. Local constraints are checked per declaration; a
//! violation only drops the offending declaration.

use crate::context::{CommandRunner, PackageBackend};
use crate::diff::needs_copy;
use crate::error::{Error, Result};
use crate::resource::DesiredFile;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Outcome of a declaration's pre-update command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheck {
    /// No pre-update command declared
    NotDeclared,
    /// The command accepted the new content
    Passed,
    /// The command is not installed yet; tolerated on bootstrap
    Exempted,
    /// The command rejected the content or could not be run
    Failed(String),
}

impl PreCheck {
    pub fn is_pass(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Reject declarations that target the same destination
pub fn check_global_constraints(files: &[DesiredFile]) -> Result<()> {
    let mut seen: HashMap<&Path, &DesiredFile> = HashMap::new();

    for file in files {
        let Some(dest) = file.destination.as_deref() else {
            continue;
        };

        if let Some(other) = seen.get(dest) {
            return Err(Error::DuplicateDestination {
                destination: dest.to_path_buf(),
                first: other.source.clone().unwrap_or_default(),
                second: file.source.clone().unwrap_or_default(),
            });
        }
        seen.insert(dest, file);
    }

    Ok(())
}

/// Run the pre-update command with the source appended as last argument.
///
/// With `allow_missing` set, a command that cannot be found passes: the
/// package providing it may only be installed by this very run.
pub fn run_pre(file: &DesiredFile, runner: &dyn CommandRunner, allow_missing: bool) -> PreCheck {
    let Some(pre) = &file.pre else {
        return PreCheck::NotDeclared;
    };

    let cmd = match &file.source {
        Some(source) => pre.clone().path(source),
        None => pre.clone(),
    };

    let output = match runner.output(&cmd) {
        Ok(output) => output,
        Err(source) => {
            let e = Error::Spawn {
                command: cmd.to_string(),
                source,
            };
            if e.is_command_not_found() && allow_missing {
                log::info!(
                    "pre-update command '{cmd}' not found, ignoring for now (its package may not be installed yet)"
                );
                return PreCheck::Exempted;
            }
            log::error!("pre-update command '{cmd}': {e}");
            return PreCheck::Failed(e.to_string());
        }
    };

    let stdout = output.stdout_str();
    let stderr = output.stderr_str();
    if !stdout.trim().is_empty() {
        log::info!("stdout from pre-update command '{cmd}': {}", stdout.trim());
    }
    if !stderr.trim().is_empty() {
        log::error!("stderr from pre-update command '{cmd}': {}", stderr.trim());
    }

    if output.success() {
        log::info!("pre-update command '{cmd}' successful");
        PreCheck::Passed
    } else {
        let e = Error::CommandFailed {
            command: cmd.to_string(),
            code: output.code,
            stderr: stderr.trim().to_string(),
        };
        log::error!("pre-update command '{cmd}': {e}");
        PreCheck::Failed(e.to_string())
    }
}

/// Whether every declared package is available from the repositories
fn packages_available(file: &DesiredFile, backend: &dyn PackageBackend) -> bool {
    file.packages.iter().all(|package| {
        if backend.exists_in_repository(package) {
            log::debug!("{package} is a valid package name");
            true
        } else {
            log::error!("{package} is not an available package");
            false
        }
    })
}

/// Keep only declarations whose packages exist and whose pre-update command
/// accepts the content.
///
/// The pre-update command only runs when the content would actually change.
/// Passing declarations are frozen for planning.
pub fn check_local_constraints(
    files: Vec<DesiredFile>,
    backend: &dyn PackageBackend,
    runner: &dyn CommandRunner,
    allow_missing_pre: bool,
) -> Vec<Arc<DesiredFile>> {
    let mut valid = Vec::with_capacity(files.len());

    for file in files {
        let file = Arc::new(file);

        if !packages_available(&file, backend) {
            log::error!("skipping {}: missing packages", file.label());
            continue;
        }

        if needs_copy(&file).is_apply() && !run_pre(&file, runner, allow_missing_pre).is_pass() {
            log::error!("skipping {}: pre-update command failed", file.label());
            continue;
        }

        valid.push(file);
    }

    valid
}
