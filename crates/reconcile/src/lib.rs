//! # Reconcile
//!
//! Converges a host towards a set of declared configuration targets.
//!
//! The crate turns declarations into an ordered list of shell commands and
//! runs them. Every probe compares the declaration with the live system
//! first, so a converged host yields an empty plan.
//!
//! ## Pipeline
//!
//! 1. [`check_global_constraints`]: no two declarations share a destination
//! 2. [`check_local_constraints`]: packages exist, pre-update commands accept
//!    the new content
//! 3. [`build_action_plan`]: package install first, then per-target actions
//! 4. [`execute`]: run the plan in order, stopping at the first failure
//!
//! ## Provider Traits
//!
//! - [`CommandRunner`]: spawns external commands
//! - [`PackageBackend`]: answers package queries for the host's manager
//! - [`ExecutionObserver`]: receives progress updates
//!
//! Concrete package managers live outside this crate and plug in through
//! [`PackageBackend`].

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod principal;
pub mod resource;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use context::{CommandRunner, ExecutionObserver, NoProgress, PackageBackend, SystemRunner};
pub use diff::Probe;
pub use error::{Error, Result};
pub use executor::{execute, perform};
pub use planner::{ActionPlan, PlannedAction, build_action_plan};
pub use principal::Principal;
pub use resource::{DesiredFile, Mode};
pub use types::{Action, ActionFailure, Cause, Cmd, CommandOutput, ExecuteSummary};
pub use validator::{PreCheck, check_global_constraints, check_local_constraints};
