//! Core types for reconciliation

use crate::resource::DesiredFile;
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::Output;
use std::sync::Arc;

/// An external command: program, literal arguments and extra environment.
///
/// Commands are never handed to a shell, so declared values cannot inject
/// additional commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    env: Vec<(String, String)>,
}

impl Cmd {
    /// Create a command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Split a declared command line on whitespace.
    ///
    /// Returns `None` for blank input.
    pub fn from_fields(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let program = fields.next()?;
        Some(Self::new(program).args(fields))
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append a path argument
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Set an environment variable for the child process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Why an action was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cause {
    /// Required packages are missing
    Pkg,
    /// Directory is missing
    Dir,
    /// Symlink is missing
    Link,
    /// Destination file is missing
    Create,
    /// Destination content differs from source
    Update,
    /// Ownership differs
    Owner,
    /// Permission bits differ
    Mode,
    /// Post-update command after any other change
    Post,
}

impl Cause {
    /// Label used in logs and plan listings
    pub fn label(&self) -> &'static str {
        match self {
            Cause::Pkg => "PACKAGE_INSTALL",
            Cause::Dir => "DIR_CREATE",
            Cause::Link => "LINK_CREATE",
            Cause::Create => "FILE_CREATE",
            Cause::Update => "FILE_UPDATE",
            Cause::Owner => "OWNER",
            Cause::Mode => "CHMOD",
            Cause::Post => "POST_UPDATE",
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A corrective command derived from a divergence between declared and live
/// state.
#[derive(Debug, Clone)]
pub struct Action {
    pub cause: Cause,
    pub command: Cmd,
    /// Declaration that caused this action; `None` for the aggregate
    /// package install
    pub trigger: Option<Arc<DesiredFile>>,
}

impl Action {
    pub fn new(cause: Cause, command: Cmd, trigger: &Arc<DesiredFile>) -> Self {
        Self {
            cause,
            command,
            trigger: Some(Arc::clone(trigger)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trigger.as_ref().and_then(|t| t.source.as_ref()) {
            Some(source) => write!(
                f,
                "[{}] {} triggered command: '{}'",
                self.cause,
                source.display(),
                self.command
            ),
            None => write!(f, "[{}] triggered command: '{}'", self.cause, self.command),
        }
    }
}

/// The action that stopped a run
#[derive(Debug, Clone)]
pub struct ActionFailure {
    pub action: Action,
    pub error: String,
}

/// Summary of an executed plan
#[derive(Debug, Clone, Default)]
pub struct ExecuteSummary {
    /// Actions that completed successfully
    pub performed: usize,
    /// Actions left unexecuted after a failure
    pub not_run: usize,
    /// The failed action, if any
    pub failure: Option<ActionFailure>,
}

impl ExecuteSummary {
    /// Check if execution was fully successful
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Total number of actions the plan contained
    pub fn total(&self) -> usize {
        self.performed + self.not_run + usize::from(self.failure.is_some())
    }
}
