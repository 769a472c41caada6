//! Action planner - derives an ordered action list from declarations

use crate::context::PackageBackend;
use crate::diff::{needs_copy, needs_directory, needs_link, needs_mode_fix, needs_owner_fix};
use crate::resource::DesiredFile;
use crate::types::{Action, Cause};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// An ordered list of corrective actions.
///
/// The aggregate package install, if any, always comes first. Actions for
/// one declaration keep the order directory, link, content, owner, mode,
/// post-update.
#[derive(Debug, Clone, Default)]
pub struct ActionPlan {
    pub actions: Vec<Action>,
}

/// Serializable view of one planned action
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub cause: Cause,
    pub command: String,
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
}

impl ActionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Number of planned actions with the given cause
    pub fn count(&self, cause: Cause) -> usize {
        self.actions.iter().filter(|a| a.cause == cause).count()
    }

    /// Causes in plan order
    pub fn causes(&self) -> Vec<Cause> {
        self.actions.iter().map(|a| a.cause).collect()
    }

    /// Report suitable for JSON output
    pub fn report(&self) -> Vec<PlannedAction> {
        self.actions
            .iter()
            .map(|action| PlannedAction {
                cause: action.cause,
                command: action.command.to_string(),
                source: action.trigger.as_ref().and_then(|t| t.source.clone()),
                destination: action.trigger.as_ref().and_then(|t| t.destination.clone()),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ActionPlan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// Single install action for every declared package that is missing.
///
/// Packages are installed in one invocation so the package manager refreshes
/// its metadata once.
pub fn packages_to_install(
    files: &[Arc<DesiredFile>],
    backend: &dyn PackageBackend,
) -> Option<Action> {
    let mut queued: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for file in files {
        for package in &file.packages {
            if seen.contains(package.as_str()) {
                log::debug!("{package} already marked to be installed");
            } else if backend.is_installed(package) {
                log::debug!("{package} already installed");
                seen.insert(package.as_str());
            } else {
                log::info!("{package} not installed");
                seen.insert(package.as_str());
                queued.push(package.as_str());
            }
        }
    }

    if queued.is_empty() {
        return None;
    }

    Some(Action {
        cause: Cause::Pkg,
        command: backend.install_command().args(queued),
        trigger: None,
    })
}

/// Actions for a single declaration, post-update last.
///
/// The post-update command is only scheduled if another action fired.
pub fn plan_file(file: &Arc<DesiredFile>) -> Vec<Action> {
    let mut actions: Vec<Action> = [
        needs_directory(file),
        needs_link(file),
        needs_copy(file),
        needs_owner_fix(file),
        needs_mode_fix(file),
    ]
    .into_iter()
    .filter_map(|probe| probe.into_action())
    .collect();

    if let Some(post) = &file.post
        && !actions.is_empty()
    {
        actions.push(Action::new(Cause::Post, post.clone(), file));
    }

    actions
}

/// Build the full plan for a validated set of declarations
pub fn build_action_plan(files: &[Arc<DesiredFile>], backend: &dyn PackageBackend) -> ActionPlan {
    let mut plan = ActionPlan::new();

    if let Some(install) = packages_to_install(files, backend) {
        plan.actions.push(install);
    }

    for file in files {
        plan.actions.extend(plan_file(file));
    }

    for action in &plan {
        log::debug!("planned: {action}");
    }

    plan
}
