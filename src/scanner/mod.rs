//! Configuration directory scanner - turns modelines into declarations

pub mod modeline;

use anyhow::{Context, Result};
use reconcile::DesiredFile;
use std::path::Path;
use walkdir::WalkDir;

pub use modeline::{parse_modeline, read_modelines};

/// Walk `dir` and build one declaration per file carrying modelines.
///
/// A file with a bad directive is skipped without affecting the others, as
/// is one declaring neither a destination nor a package. Failing to walk or
/// read the directory aborts the scan.
pub fn parse_files(dir: &Path) -> Result<Vec<DesiredFile>> {
    log::debug!("using configuration directory '{}'", dir.display());
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let modelines = read_modelines(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if modelines.is_empty() {
            continue;
        }
        log::debug!("{} modelines found in {}", modelines.len(), path.display());

        let source = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let mut file = DesiredFile::new(&source);

        if let Err(e) = modelines
            .iter()
            .try_for_each(|line| parse_modeline(line, &mut file))
        {
            log::error!("skipping {}: {e}", path.display());
            continue;
        }

        if file.destination.is_none() && file.packages.is_empty() {
            log::error!(
                "skipping {}: no 'destfile', 'symlink' or 'package' directive",
                path.display()
            );
            continue;
        }

        log::debug!("'{}' modeline syntax OK", path.display());
        files.push(file);
    }

    Ok(files)
}
