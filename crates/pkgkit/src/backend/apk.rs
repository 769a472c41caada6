//! Alpine backend using `apk`.

use super::{query_status, query_stdout};
use reconcile::{Cmd, CommandRunner, PackageBackend};
use std::sync::Arc;

pub struct ApkBackend {
    runner: Arc<dyn CommandRunner>,
}

impl ApkBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl PackageBackend for ApkBackend {
    fn name(&self) -> &'static str {
        "apk"
    }

    /// `apk search -e` prints `<name>-<version>` for an exact match
    fn exists_in_repository(&self, package: &str) -> bool {
        query_stdout(
            self.runner.as_ref(),
            &Cmd::new("apk").args(["search", "-e"]).arg(package),
        )
        .is_some_and(|out| out.starts_with(package))
    }

    fn is_installed(&self, package: &str) -> bool {
        query_status(
            self.runner.as_ref(),
            &Cmd::new("apk").args(["info", "-e"]).arg(package),
        )
    }

    fn install_command(&self) -> Cmd {
        Cmd::new("apk").arg("add")
    }
}
