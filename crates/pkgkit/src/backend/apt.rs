//! Debian/Ubuntu backend using `apt-cache` and `apt-get`.

use super::query_stdout;
use reconcile::{Cmd, CommandRunner, PackageBackend};
use std::sync::Arc;

pub struct AptBackend {
    runner: Arc<dyn CommandRunner>,
}

impl AptBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn policy(&self, package: &str) -> Option<String> {
        query_stdout(
            self.runner.as_ref(),
            &Cmd::new("apt-cache").arg("policy").arg(package),
        )
    }
}

/// Installed version from `apt-cache policy` output, if any
fn installed_version(policy: &str) -> Option<&str> {
    policy
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Installed:"))
        .map(str::trim)
        .find(|version| !version.is_empty() && *version != "(none)")
}

impl PackageBackend for AptBackend {
    fn name(&self) -> &'static str {
        "apt"
    }

    /// `apt-cache policy` prints nothing for unknown names, and a block
    /// headed by the name for known ones.
    fn exists_in_repository(&self, package: &str) -> bool {
        self.policy(package)
            .is_some_and(|out| out.starts_with(package))
    }

    fn is_installed(&self, package: &str) -> bool {
        self.policy(package)
            .is_some_and(|out| installed_version(&out).is_some())
    }

    fn install_command(&self) -> Cmd {
        Cmd::new("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .args(["-y", "install"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedRunner;

    const VIM_INSTALLED: &str = "vim:
  Installed: 2:9.0.1378-2
  Candidate: 2:9.0.1378-2
  Version table:
 *** 2:9.0.1378-2 500
        500 http://deb.debian.org/debian bookworm/main amd64 Packages
";

    const NGINX_AVAILABLE: &str = "nginx:
  Installed: (none)
  Candidate: 1.22.1-9
  Version table:
     1.22.1-9 500
";

    fn backend() -> AptBackend {
        let runner = ScriptedRunner::default()
            .reply("apt-cache policy vim", 0, VIM_INSTALLED)
            .reply("apt-cache policy nginx", 0, NGINX_AVAILABLE)
            .reply("apt-cache policy no-such-pkg", 0, "");
        AptBackend::new(Arc::new(runner))
    }

    #[test]
    fn test_exists_in_repository() {
        let apt = backend();
        assert!(apt.exists_in_repository("vim"));
        assert!(apt.exists_in_repository("nginx"));
        assert!(!apt.exists_in_repository("no-such-pkg"));
    }

    #[test]
    fn test_is_installed() {
        let apt = backend();
        assert!(apt.is_installed("vim"));
        assert!(!apt.is_installed("nginx"));
        assert!(!apt.is_installed("no-such-pkg"));
    }

    #[test]
    fn test_query_failure_is_unavailable() {
        // "curl" has no scripted reply, so the query cannot be run
        let apt = backend();
        assert!(!apt.exists_in_repository("curl"));
        assert!(!apt.is_installed("curl"));
    }

    #[test]
    fn test_install_command_is_noninteractive() {
        let cmd = backend().install_command().arg("vim");
        assert_eq!(
            cmd.to_string(),
            "DEBIAN_FRONTEND=noninteractive apt-get -y install vim"
        );
    }

    #[test]
    fn test_installed_version() {
        assert_eq!(installed_version(VIM_INSTALLED), Some("2:9.0.1378-2"));
        assert_eq!(installed_version(NGINX_AVAILABLE), None);
    }
}
