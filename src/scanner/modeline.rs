//! Modeline parsing
//!
//! A modeline is any line in the head of a file containing `hearth:`,
//! followed by comma-separated `key=value` directives:
//!
//! ```text
//! # hearth: destfile=/etc/ssh/sshd_config, owner=root, group=root, mode=0644
//! # hearth: package=openssh-server, pre=/usr/sbin/sshd -t -f
//! ```

use reconcile::DesiredFile;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Substring identifying a modeline
pub const MARKER: &str = "hearth:";

/// Only the head of a file is scanned
pub const MAX_LINES: usize = 10;

static MODELINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"hearth:(.*)").expect("Invalid regex pattern"));

#[derive(Debug, Error)]
pub enum ModelineError {
    #[error("invalid modeline: {0}")]
    NotAModeline(String),

    #[error("invalid keyword/argument '{0}'")]
    BadElement(String),

    #[error("'{key}={value}': {source}")]
    Rejected {
        key: String,
        value: String,
        #[source]
        source: reconcile::Error,
    },
}

/// Lines containing the marker within the first [`MAX_LINES`] lines.
///
/// Invalid UTF-8 is replaced, so binary files never fail the scan.
pub fn read_modelines(path: &Path) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut modelines = Vec::new();
    let mut buf = Vec::new();

    for _ in 0..MAX_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.contains(MARKER) {
            modelines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
    }

    Ok(modelines)
}

/// Apply every directive of one modeline to `file`.
///
/// Text before the marker is ignored. The first bad directive stops parsing
/// and is returned; directives before it have already been applied.
pub fn parse_modeline(line: &str, file: &mut DesiredFile) -> Result<(), ModelineError> {
    let directives = MODELINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ModelineError::NotAModeline(line.to_string()))?;

    for element in directives.as_str().split(',').map(str::trim) {
        if element.is_empty() {
            continue;
        }

        let (key, value) = element
            .split_once('=')
            .ok_or_else(|| ModelineError::BadElement(element.to_string()))?;

        let applied = match key {
            "destfile" => file.add_destination(value),
            "symlink" => file.add_link(value),
            "owner" => file.add_owner(value),
            "group" => file.add_group(value),
            "mode" => file.add_mode(value),
            "package" => {
                file.add_package(value);
                Ok(())
            }
            "pre" => {
                file.add_pre(value);
                Ok(())
            }
            "post" => {
                file.add_post(value);
                Ok(())
            }
            _ => return Err(ModelineError::BadElement(element.to_string())),
        };

        applied.map_err(|source| ModelineError::Rejected {
            key: key.to_string(),
            value: value.to_string(),
            source,
        })?;
    }

    Ok(())
}
