//! Arch backend: plain `pacman`, or the `yay` AUR helper which accepts the
//! same operations and also resolves AUR packages.

use super::{query_status, query_stdout};
use reconcile::{Cmd, CommandRunner, PackageBackend};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Pacman,
    Yay,
}

impl Flavor {
    fn program(self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::Yay => "yay",
        }
    }
}

pub struct PacmanBackend {
    runner: Arc<dyn CommandRunner>,
    flavor: Flavor,
}

impl PacmanBackend {
    pub fn pacman(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            flavor: Flavor::Pacman,
        }
    }

    pub fn yay(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            flavor: Flavor::Yay,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn cmd(&self) -> Cmd {
        Cmd::new(self.flavor.program())
    }
}

impl PackageBackend for PacmanBackend {
    fn name(&self) -> &'static str {
        self.flavor.program()
    }

    fn exists_in_repository(&self, package: &str) -> bool {
        query_stdout(self.runner.as_ref(), &self.cmd().arg("-Si").arg(package))
            .is_some_and(|out| !out.starts_with("error:"))
    }

    fn is_installed(&self, package: &str) -> bool {
        query_status(self.runner.as_ref(), &self.cmd().arg("-Q").arg(package))
    }

    fn install_command(&self) -> Cmd {
        self.cmd().args(["-S", "--noconfirm"])
    }
}
