//! RPM-family backend using `yum` for repository queries and `rpm` for the
//! installed database.

use super::{query_status, query_stdout};
use reconcile::{Cmd, CommandRunner, PackageBackend};
use std::sync::Arc;

pub struct YumBackend {
    runner: Arc<dyn CommandRunner>,
}

impl YumBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Whether `yum info` output has a `Name : <package>` field
fn has_name_field(info: &str, package: &str) -> bool {
    info.lines().any(|line| {
        line.split_once(':')
            .is_some_and(|(key, value)| key.trim() == "Name" && value.trim() == package)
    })
}

impl PackageBackend for YumBackend {
    fn name(&self) -> &'static str {
        "yum"
    }

    fn exists_in_repository(&self, package: &str) -> bool {
        query_stdout(
            self.runner.as_ref(),
            &Cmd::new("yum").arg("info").arg(package),
        )
        .is_some_and(|out| has_name_field(&out, package))
    }

    fn is_installed(&self, package: &str) -> bool {
        query_status(
            self.runner.as_ref(),
            &Cmd::new("rpm").arg("-q").arg(package),
        )
    }

    fn install_command(&self) -> Cmd {
        Cmd::new("yum").args(["-y", "install"])
    }
}
