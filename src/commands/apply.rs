//! `apply` and `plan` commands

use anyhow::{Context as _, Result, bail};
use reconcile::{
    Action, ActionPlan, CommandRunner, ExecuteSummary, ExecutionObserver, SystemRunner,
    build_action_plan, execute,
};
use std::sync::Arc;

use crate::Context;
use crate::cli::{ApplyArgs, PlanArgs};
use crate::commands::validate;
use crate::ui;

/// Renders execution progress on the terminal
struct TerminalProgress {
    quiet: bool,
}

impl ExecutionObserver for TerminalProgress {
    fn on_action_start(&mut self, index: usize, total: usize, action: &Action) {
        if !self.quiet {
            ui::step(index + 1, total, &ui::describe(action));
        }
    }

    fn on_action_complete(&mut self, action: &Action, result: &reconcile::Result<()>) {
        if let Err(e) = result {
            ui::error(&format!("{}: {e}", action.command));
        }
    }
}

/// Converge the host
pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let validated = validate(args.conf.conf_dir.as_deref(), &runner, !args.strict_pre)?;
    if validated.rejected > 0 && !ctx.quiet {
        ui::warn(&format!(
            "{} declaration(s) skipped, see log for details",
            validated.rejected
        ));
    }

    let plan = build_action_plan(&validated.files, validated.backend.as_ref());

    if args.dry_run {
        if !ctx.quiet {
            ui::plan(&plan);
        }
        return Ok(());
    }

    if plan.is_empty() {
        if !ctx.quiet {
            ui::success("Nothing to do, host is in sync");
        }
        return Ok(());
    }

    let mut progress = TerminalProgress { quiet: ctx.quiet };
    let summary = execute(&plan, runner.as_ref(), &mut progress);

    if let Some(message) = failure_message(&summary) {
        bail!(message);
    }

    if !ctx.quiet {
        ui::success(&format!("Applied {} actions", summary.performed));
    }
    Ok(())
}

/// Print what `apply` would do
pub fn plan(ctx: &Context, args: PlanArgs) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let validated = validate(args.conf.conf_dir.as_deref(), &runner, true)?;
    let plan = build_action_plan(&validated.files, validated.backend.as_ref());

    if args.json {
        println!("{}", render_json(&plan)?);
    } else if !ctx.quiet {
        ui::plan(&plan);
    }
    Ok(())
}

/// Describe where execution stopped, if it did
fn failure_message(summary: &ExecuteSummary) -> Option<String> {
    summary.failure.as_ref().map(|failure| {
        format!(
            "{} failed after {} of {} actions ({} not run): {}",
            failure.action.cause,
            summary.performed,
            summary.total(),
            summary.not_run,
            failure.error
        )
    })
}

fn render_json(plan: &ActionPlan) -> Result<String> {
    serde_json::to_string_pretty(&plan.report()).context("Failed to serialize plan")
}
