//! `check` command - parse and validate without planning

use anyhow::{Result, bail};
use reconcile::{CommandRunner, SystemRunner};
use std::sync::Arc;

use crate::Context;
use crate::cli::ConfDirArgs;
use crate::commands::validate;
use crate::ui;

pub fn run(ctx: &Context, args: ConfDirArgs) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let validated = validate(args.conf_dir.as_deref(), &runner, true)?;

    if !ctx.quiet {
        ui::header("Configuration");
        ui::kv("directory", &validated.conf_dir.display().to_string());
        ui::kv("package backend", validated.backend.name());
        ui::kv("valid declarations", &validated.files.len().to_string());
        ui::kv("rejected declarations", &validated.rejected.to_string());
        if ctx.verbose > 0 {
            for file in &validated.files {
                ui::dim(&file.label());
            }
        }
    }

    if validated.rejected > 0 {
        bail!(
            "{} declaration(s) failed validation, see log for details",
            validated.rejected
        );
    }

    if !ctx.quiet {
        ui::success("Configuration is valid");
    }
    Ok(())
}
