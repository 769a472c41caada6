use colored::{ColoredString, Colorize};
use reconcile::{Action, ActionPlan, Cause};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Cause label colored by what the action touches
pub fn cause(cause: Cause) -> ColoredString {
    let label = cause.label();
    match cause {
        Cause::Pkg => label.magenta(),
        Cause::Dir | Cause::Link | Cause::Create => label.green(),
        Cause::Update => label.yellow(),
        Cause::Owner | Cause::Mode => label.cyan(),
        Cause::Post => label.blue(),
    }
}

/// One-line description of an action
pub fn describe(action: &Action) -> String {
    let target = action
        .trigger
        .as_ref()
        .and_then(|t| t.destination.as_ref().or(t.directory.as_ref()))
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default();
    format!("{}{target}", cause(action.cause))
}

/// List every action of a plan with its command
pub fn plan(plan: &ActionPlan) {
    if plan.is_empty() {
        success("Nothing to do, host is in sync");
        return;
    }

    header(&format!("Plan ({} actions)", plan.len()));
    for action in plan {
        println!("  {}", describe(action));
        dim(&format!("$ {}", action.command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{Cmd, DesiredFile};
    use std::sync::Arc;

    #[test]
    fn test_describe_uses_destination() {
        colored::control::set_override(false);
        let mut file = DesiredFile::new("/conf/motd");
        file.add_destination("/etc/motd").unwrap();
        let action = Action::new(Cause::Create, Cmd::new("cp"), &Arc::new(file));

        assert_eq!(describe(&action), "FILE_CREATE /etc/motd");
    }

    #[test]
    fn test_describe_package_install() {
        colored::control::set_override(false);
        let action = Action {
            cause: Cause::Pkg,
            command: Cmd::new("apk").arg("add"),
            trigger: None,
        };
        assert_eq!(describe(&action), "PACKAGE_INSTALL");
    }
}
