//! Package manager backends.
//!
//! Each backend implements [`PackageBackend`] by running the manager's own
//! query commands through a [`CommandRunner`]. Queries fail closed: a
//! command that cannot be run counts as "not available" or "not installed".

pub mod apk;
pub mod apt;
pub mod pacman;
pub mod yum;

use reconcile::{Cmd, CommandRunner, PackageBackend};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Known package manager families, in probe order.
///
/// A wrapper is listed before the manager it wraps so a host with both is
/// classified as the wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Apt,
    Yum,
    Apk,
    Yay,
    Pacman,
}

impl BackendKind {
    /// All kinds, in probe order
    pub const ALL: [Self; 5] = [Self::Apt, Self::Yum, Self::Apk, Self::Yay, Self::Pacman];

    /// Executable whose presence identifies this backend
    pub fn executable(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Yum => "yum",
            Self::Apk => "apk",
            Self::Yay => "yay",
            Self::Pacman => "pacman",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Yum => "yum",
            Self::Apk => "apk",
            Self::Yay => "yay",
            Self::Pacman => "pacman",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static DETECTED: OnceLock<Option<BackendKind>> = OnceLock::new();

/// Detect the host's package manager by looking for its executable on PATH.
///
/// Computed once per process; later calls return the cached answer.
pub fn detect() -> Option<BackendKind> {
    *DETECTED.get_or_init(|| {
        let kind = detect_with(|exe| which::which(exe).is_ok());
        match kind {
            Some(kind) => log::debug!("detected package manager: {kind}"),
            None => log::debug!("no known package manager on PATH"),
        }
        kind
    })
}

/// First kind in probe order whose executable `is_present` accepts
pub fn detect_with(is_present: impl Fn(&str) -> bool) -> Option<BackendKind> {
    BackendKind::ALL
        .into_iter()
        .find(|kind| is_present(kind.executable()))
}

/// Comma-separated list of probed executables, for error messages
pub fn probed_executables() -> String {
    BackendKind::ALL
        .iter()
        .map(BackendKind::executable)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Construct the backend for `kind`
pub fn backend_for(kind: BackendKind, runner: Arc<dyn CommandRunner>) -> Box<dyn PackageBackend> {
    match kind {
        BackendKind::Apt => Box::new(apt::AptBackend::new(runner)),
        BackendKind::Yum => Box::new(yum::YumBackend::new(runner)),
        BackendKind::Apk => Box::new(apk::ApkBackend::new(runner)),
        BackendKind::Yay => Box::new(pacman::PacmanBackend::yay(runner)),
        BackendKind::Pacman => Box::new(pacman::PacmanBackend::pacman(runner)),
    }
}

/// Stdout of a successful query, or `None` if it could not run or exited
/// non-zero.
pub(crate) fn query_stdout(runner: &dyn CommandRunner, cmd: &Cmd) -> Option<String> {
    match runner.run(cmd) {
        Ok(output) => Some(output.stdout_str()),
        Err(e) => {
            log::error!("package query failed: {e}");
            None
        }
    }
}

/// Whether a query exited successfully; spawn failures count as `false`.
pub(crate) fn query_status(runner: &dyn CommandRunner, cmd: &Cmd) -> bool {
    match runner.output(cmd) {
        Ok(output) => output.success(),
        Err(e) => {
            log::error!("package query '{cmd}' could not be run: {e}");
            false
        }
    }
}
