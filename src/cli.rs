use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::paths::ENV_CONFIG_DIR;

#[derive(Parser)]
#[command(name = "hearth")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative host configuration from annotated files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring the host in line with the configuration directory
    Apply(ApplyArgs),

    /// Show the actions apply would run, without running them
    Plan(PlanArgs),

    /// Parse and validate the configuration directory
    Check(ConfDirArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ConfDirArgs {
    /// Configuration directory [default: ~/hearth]
    #[arg(long, env = ENV_CONFIG_DIR)]
    pub conf_dir: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub conf: ConfDirArgs,

    /// Print the plan instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Fail declarations whose pre-update command is not installed yet
    #[arg(long)]
    pub strict_pre: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub conf: ConfDirArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}
