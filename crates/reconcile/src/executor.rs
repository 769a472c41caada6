//! Execution engine - runs a plan in order, stopping at the first failure

use crate::context::{CommandRunner, ExecutionObserver};
use crate::error::{Error, Result};
use crate::planner::ActionPlan;
use crate::types::{Action, ActionFailure, ExecuteSummary};

/// Run one action's command, logging whatever it printed
pub fn perform(action: &Action, runner: &dyn CommandRunner) -> Result<()> {
    let output = runner.output(&action.command).map_err(|source| Error::Spawn {
        command: action.command.to_string(),
        source,
    })?;

    let stdout = output.stdout_str();
    let stderr = output.stderr_str();
    if !stdout.trim().is_empty() {
        log::info!("stdout from '{}': {}", action.command, stdout.trim());
    }
    if !stderr.trim().is_empty() {
        log::error!("stderr from '{}': {}", action.command, stderr.trim());
    }

    if !output.success() {
        return Err(Error::CommandFailed {
            command: action.command.to_string(),
            code: output.code,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

/// Execute the plan sequentially.
///
/// Later actions may rely on earlier ones (a chmod needs the file created
/// before it), so the first failure ends the run.
pub fn execute<O: ExecutionObserver>(
    plan: &ActionPlan,
    runner: &dyn CommandRunner,
    observer: &mut O,
) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    let total = plan.len();

    for (index, action) in plan.iter().enumerate() {
        log::info!("running {action}");
        observer.on_action_start(index, total, action);

        let result = perform(action, runner);
        observer.on_action_complete(action, &result);

        if let Err(e) = result {
            log::error!(
                "{} failed (trigger: {}, command: '{}'): {e}",
                action.cause,
                action
                    .trigger
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |t| t.label()),
                action.command
            );
            summary.not_run = total - index - 1;
            summary.failure = Some(ActionFailure {
                action: action.clone(),
                error: e.to_string(),
            });
            if summary.not_run > 0 {
                log::error!("aborting: {} remaining action(s) not run", summary.not_run);
            }
            return summary;
        }

        summary.performed += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NoProgress, PackageBackend, SystemRunner};
    use crate::planner::build_action_plan;
    use crate::resource::DesiredFile;
    use crate::types::{Cause, Cmd, CommandOutput};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Runner that records commands and fails any whose program is listed
    #[derive(Default)]
    struct ScriptedRunner {
        failing: Vec<&'static str>,
        ran: Mutex<Vec<String>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn output(&self, cmd: &Cmd) -> std::io::Result<CommandOutput> {
            self.ran.lock().unwrap().push(cmd.to_string());
            let code = if self.failing.iter().any(|p| *p == cmd.program()) {
                1
            } else {
                0
            };
            Ok(CommandOutput {
                stdout: b"done\n".to_vec(),
                stderr: Vec::new(),
                code: Some(code),
            })
        }
    }

    struct NothingInstalled;

    impl PackageBackend for NothingInstalled {
        fn name(&self) -> &'static str {
            "none"
        }
        fn exists_in_repository(&self, _package: &str) -> bool {
            true
        }
        fn is_installed(&self, _package: &str) -> bool {
            false
        }
        fn install_command(&self) -> Cmd {
            Cmd::new("pkg-install")
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<usize>,
        completed: usize,
    }

    impl ExecutionObserver for Recorder {
        fn on_action_start(&mut self, index: usize, _total: usize, _action: &Action) {
            self.started.push(index);
        }
        fn on_action_complete(&mut self, _action: &Action, _result: &Result<()>) {
            self.completed += 1;
        }
    }

    fn plan_of(commands: &[&str]) -> ActionPlan {
        ActionPlan {
            actions: commands
                .iter()
                .map(|c| Action {
                    cause: Cause::Pkg,
                    command: Cmd::from_fields(c).unwrap(),
                    trigger: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let summary = execute(&ActionPlan::new(), &ScriptedRunner::default(), &mut NoProgress);
        assert!(summary.is_success());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_execute_runs_in_order() {
        let runner = ScriptedRunner::default();
        let mut recorder = Recorder::default();
        let summary = execute(&plan_of(&["a 1", "b 2", "c 3"]), &runner, &mut recorder);

        assert!(summary.is_success());
        assert_eq!(summary.performed, 3);
        assert_eq!(*runner.ran.lock().unwrap(), ["a 1", "b 2", "c 3"]);
        assert_eq!(recorder.started, [0, 1, 2]);
        assert_eq!(recorder.completed, 3);
    }

    #[test]
    fn test_execute_stops_at_first_failure() {
        let runner = ScriptedRunner {
            failing: vec!["b"],
            ..Default::default()
        };
        let summary = execute(&plan_of(&["a", "b", "c", "d"]), &runner, &mut NoProgress);

        assert!(!summary.is_success());
        assert_eq!(summary.performed, 1);
        assert_eq!(summary.not_run, 2);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.failure.unwrap().action.command.program(), "b");
        assert_eq!(*runner.ran.lock().unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_perform_spawn_failure() {
        let action = &plan_of(&["/nonexistent/hearth-cmd"]).actions[0];
        let err = perform(action, &SystemRunner).unwrap_err();
        assert!(err.is_command_not_found());
    }

    #[test]
    fn test_second_plan_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("motd");
        fs::write(&source, "welcome\n").unwrap();

        let mut file = DesiredFile::new(&source);
        file.add_destination(dir.path().join("etc/motd")).unwrap();
        file.add_mode("0600").unwrap();
        let files = [Arc::new(file)];

        let first = build_action_plan(&files, &NothingInstalled);
        assert_eq!(first.causes(), [Cause::Dir, Cause::Create, Cause::Mode]);

        let summary = execute(&first, &SystemRunner, &mut NoProgress);
        assert!(summary.is_success(), "{:?}", summary.failure);

        let dest = dir.path().join("etc/motd");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "welcome\n");
        assert_eq!(
            fs::metadata(&dest).unwrap().permissions().mode() & 0o7777,
            0o600
        );

        let second = build_action_plan(&files, &NothingInstalled);
        assert!(second.is_empty(), "unexpected actions: {:?}", second.causes());
    }

    #[test]
    fn test_link_plan_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("vimrc");
        fs::write(&source, "set nocompatible\n").unwrap();

        let mut file = DesiredFile::new(&source);
        file.add_link(dir.path().join("home/.vimrc")).unwrap();
        let files = [Arc::new(file)];

        let first = build_action_plan(&files, &NothingInstalled);
        assert_eq!(first.causes(), [Cause::Dir, Cause::Link]);
        assert!(execute(&first, &SystemRunner, &mut NoProgress).is_success());

        assert!(build_action_plan(&files, &NothingInstalled).is_empty());
    }
}
