//! Live-state probes
//!
//! Each probe compares one aspect of a declaration against the filesystem
//! and reports whether a corrective action is needed. Probes never raise:
//! anything they cannot determine safely becomes [`Probe::Suppressed`] and
//! no action is emitted for it.

use crate::principal;
use crate::resource::DesiredFile;
use crate::types::{Action, Cause, Cmd};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

/// Outcome of comparing one aspect of declared and live state
#[derive(Debug, Clone)]
pub enum Probe {
    /// Live state diverges; this action corrects it
    Apply(Action),
    /// Live state already matches the declaration
    InSync,
    /// The declaration does not ask for this aspect
    NotApplicable,
    /// State diverges or is unknown, but acting would be unsafe
    Suppressed { reason: String },
}

impl Probe {
    fn suppressed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::error!("{reason}");
        Self::Suppressed { reason }
    }

    pub fn is_apply(&self) -> bool {
        matches!(self, Self::Apply(_))
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Apply(action) => Some(action),
            _ => None,
        }
    }

    /// Cause of the planned action, if any
    pub fn cause(&self) -> Option<Cause> {
        match self {
            Self::Apply(action) => Some(action.cause),
            _ => None,
        }
    }
}

/// BLAKE3 fingerprint of a file's contents
pub fn fingerprint(path: &Path) -> io::Result<blake3::Hash> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Ensure the declared directory exists
pub fn needs_directory(file: &Arc<DesiredFile>) -> Probe {
    let Some(dir) = &file.directory else {
        return Probe::NotApplicable;
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            log::debug!("{} is a directory already", dir.display());
            Probe::InSync
        }
        Ok(_) => Probe::suppressed(format!(
            "{} exists and is not a directory",
            dir.display()
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("{} does not exist", dir.display());
            Probe::Apply(Action::new(
                Cause::Dir,
                Cmd::new("mkdir").arg("-p").path(dir),
                file,
            ))
        }
        Err(e) => Probe::suppressed(format!("cannot stat {}: {e}", dir.display())),
    }
}

/// Create the symlink if the destination is free.
///
/// Existing paths are never replaced, even when they point elsewhere.
pub fn needs_link(file: &Arc<DesiredFile>) -> Probe {
    if !file.is_link {
        return Probe::NotApplicable;
    }
    let (Some(source), Some(dest)) = (&file.source, &file.destination) else {
        return Probe::NotApplicable;
    };

    let meta = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Probe::Apply(Action::new(
                Cause::Link,
                Cmd::new("ln").arg("-s").path(source).path(dest),
                file,
            ));
        }
        Err(e) => return Probe::suppressed(format!("cannot lstat {}: {e}", dest.display())),
    };

    if !meta.file_type().is_symlink() {
        return Probe::suppressed(format!("{} already exists", dest.display()));
    }

    let resolved = match dest.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            return Probe::suppressed(format!("cannot resolve symlink {}: {e}", dest.display()));
        }
    };
    let expected = source.canonicalize().unwrap_or_else(|_| source.clone());

    if resolved == expected {
        log::debug!(
            "{} is a symlink to {} already",
            dest.display(),
            source.display()
        );
        Probe::InSync
    } else {
        Probe::suppressed(format!(
            "{} is a symlink to {} instead of {}",
            dest.display(),
            resolved.display(),
            source.display()
        ))
    }
}

/// Copy the source over the destination if their contents differ
pub fn needs_copy(file: &Arc<DesiredFile>) -> Probe {
    if !file.wants_copy() {
        return Probe::NotApplicable;
    }
    let (Some(source), Some(dest)) = (&file.source, &file.destination) else {
        return Probe::NotApplicable;
    };

    let source_hash = match fingerprint(source) {
        Ok(hash) => hash,
        Err(e) => {
            return Probe::suppressed(format!(
                "cannot fingerprint source file {}: {e}",
                source.display()
            ));
        }
    };

    let cause = match fingerprint(dest) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("{} does not exist", dest.display());
            Cause::Create
        }
        Err(e) => {
            return Probe::suppressed(format!(
                "cannot fingerprint destination file {}: {e}",
                dest.display()
            ));
        }
        Ok(dest_hash) if dest_hash == source_hash => {
            log::debug!(
                "same blake3 for {} and {}: {}",
                source.display(),
                dest.display(),
                source_hash.to_hex()
            );
            return Probe::InSync;
        }
        Ok(dest_hash) => {
            log::debug!(
                "blake3[{}]={} != blake3[{}]={}",
                source.display(),
                source_hash.to_hex(),
                dest.display(),
                dest_hash.to_hex()
            );
            Cause::Update
        }
    };

    Probe::Apply(Action::new(
        cause,
        Cmd::new("cp").path(source).path(dest),
        file,
    ))
}

/// Fix ownership of the destination.
///
/// A missing destination still gets the action, to run right after the
/// file is created.
pub fn needs_owner_fix(file: &Arc<DesiredFile>) -> Probe {
    let Some(dest) = &file.destination else {
        return Probe::NotApplicable;
    };

    // 'user', ':group' or 'user:group'
    let spec = match (&file.owner, &file.group) {
        (None, None) => return Probe::NotApplicable,
        (Some(user), None) => user.name.clone(),
        (None, Some(group)) => format!(":{}", group.name),
        (Some(user), Some(group)) => format!("{}:{}", user.name, group.name),
    };
    let action = Action::new(Cause::Owner, Cmd::new("chown").arg(&spec).path(dest), file);

    let meta = match fs::metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Probe::Apply(action),
        Err(e) => return Probe::suppressed(format!("cannot stat {}: {e}", dest.display())),
    };

    if let Some(user) = &file.owner
        && meta.uid() != user.id
    {
        log::info!(
            "{} is owned by {} instead of {}",
            dest.display(),
            principal::user_name(meta.uid()).unwrap_or_else(|| format!("uid {}", meta.uid())),
            user.name
        );
        return Probe::Apply(action);
    }

    if let Some(group) = &file.group
        && meta.gid() != group.id
    {
        log::info!(
            "{} is owned by gid {} instead of {}",
            dest.display(),
            meta.gid(),
            group.name
        );
        return Probe::Apply(action);
    }

    log::debug!(
        "{} is owned by {}:{} already",
        dest.display(),
        meta.uid(),
        meta.gid()
    );
    Probe::InSync
}

/// Fix permission bits of the destination.
///
/// A missing destination still gets the action, to run right after the
/// file is created.
pub fn needs_mode_fix(file: &Arc<DesiredFile>) -> Probe {
    let (Some(mode), Some(dest)) = (&file.mode, &file.destination) else {
        return Probe::NotApplicable;
    };
    let action = Action::new(
        Cause::Mode,
        Cmd::new("chmod").arg(mode.as_str()).path(dest),
        file,
    );

    let meta = match fs::metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Probe::Apply(action),
        Err(e) => return Probe::suppressed(format!("cannot stat {}: {e}", dest.display())),
    };

    let wanted = match mode.bits() {
        Ok(bits) => bits,
        Err(e) => return Probe::suppressed(format!("invalid mode {mode}: {e}")),
    };
    let current = meta.permissions().mode() & 0o7777;

    if current == wanted {
        log::debug!("{} is {:04o} already", dest.display(), current);
        Probe::InSync
    } else {
        log::info!(
            "{} is {:04o} instead of {:04o}",
            dest.display(),
            current,
            wanted
        );
        Probe::Apply(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Principal;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn copy_of(source: &Path, dest: &Path) -> Arc<DesiredFile> {
        let mut file = DesiredFile::new(source);
        file.add_destination(dest).unwrap();
        Arc::new(file)
    }

    fn link_of(source: &Path, dest: &Path) -> Arc<DesiredFile> {
        let mut file = DesiredFile::new(source);
        file.add_link(dest).unwrap();
        Arc::new(file)
    }

    #[test]
    fn test_fingerprint_matches_content() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a", "same");
        let b = write(&dir, "b", "same");
        let c = write(&dir, "c", "different");

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
        assert_eq!(fingerprint(&a).unwrap(), blake3::hash(b"same"));
    }

    #[test]
    fn test_copy_create_when_missing() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let file = copy_of(&source, &dir.path().join("dest"));

        let probe = needs_copy(&file);
        assert_eq!(probe.cause(), Some(Cause::Create));
        let action = probe.into_action().unwrap();
        assert_eq!(action.command.program(), "cp");
    }

    #[test]
    fn test_copy_in_sync_when_equal() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let dest = write(&dir, "dest", "content");

        assert!(matches!(needs_copy(&copy_of(&source, &dest)), Probe::InSync));
    }

    #[test]
    fn test_copy_update_when_different() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "new");
        let dest = write(&dir, "dest", "old");

        assert_eq!(needs_copy(&copy_of(&source, &dest)).cause(), Some(Cause::Update));
    }

    #[test]
    fn test_copy_suppressed_on_unreadable_source() {
        let dir = TempDir::new().unwrap();
        let file = copy_of(&dir.path().join("missing"), &dir.path().join("dest"));

        assert!(matches!(needs_copy(&file), Probe::Suppressed { .. }));
    }

    #[test]
    fn test_copy_suppressed_when_destination_is_directory() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let dest = dir.path().join("sub");
        fs::create_dir(&dest).unwrap();

        assert!(matches!(
            needs_copy(&copy_of(&source, &dest)),
            Probe::Suppressed { .. }
        ));
    }

    #[test]
    fn test_link_and_copy_are_exclusive() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let dest = dir.path().join("dest");

        let link = link_of(&source, &dest);
        assert!(matches!(needs_copy(&link), Probe::NotApplicable));
        assert_eq!(needs_link(&link).cause(), Some(Cause::Link));

        let copy = copy_of(&source, &dest);
        assert!(matches!(needs_link(&copy), Probe::NotApplicable));
    }

    #[test]
    fn test_link_in_sync() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let dest = dir.path().join("dest");
        symlink(&source, &dest).unwrap();

        assert!(matches!(needs_link(&link_of(&source, &dest)), Probe::InSync));
    }

    #[test]
    fn test_link_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "content");
        let other = write(&dir, "other", "content");

        let regular = write(&dir, "regular", "content");
        assert!(matches!(
            needs_link(&link_of(&source, &regular)),
            Probe::Suppressed { .. }
        ));

        let wrong = dir.path().join("wrong");
        symlink(&other, &wrong).unwrap();
        assert!(matches!(
            needs_link(&link_of(&source, &wrong)),
            Probe::Suppressed { .. }
        ));
    }

    #[test]
    fn test_directory_probe() {
        let dir = TempDir::new().unwrap();

        let mut file = DesiredFile::default();
        file.add_directory(dir.path().join("a/b/c"));
        let action = needs_directory(&Arc::new(file)).into_action().unwrap();
        assert_eq!(action.cause, Cause::Dir);
        assert_eq!(action.command.program(), "mkdir");
        assert_eq!(action.command.get_args()[0], "-p");

        let mut file = DesiredFile::default();
        file.add_directory(dir.path());
        assert!(matches!(needs_directory(&Arc::new(file)), Probe::InSync));

        let mut file = DesiredFile::default();
        file.add_directory(write(&dir, "plain", ""));
        assert!(matches!(
            needs_directory(&Arc::new(file)),
            Probe::Suppressed { .. }
        ));
    }

    #[test]
    fn test_owner_not_declared() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "x");
        assert!(matches!(
            needs_owner_fix(&copy_of(&source, &source)),
            Probe::NotApplicable
        ));
    }

    #[test]
    fn test_owner_prestaged_for_missing_destination() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "x");
        let mut file = DesiredFile::new(&source);
        file.add_destination(dir.path().join("dest")).unwrap();
        file.group = Some(Principal::new("staff", 50));

        let action = needs_owner_fix(&Arc::new(file)).into_action().unwrap();
        assert_eq!(action.cause, Cause::Owner);
        assert_eq!(action.command.get_args()[0], ":staff");
    }

    #[test]
    fn test_owner_compares_numeric_ids() {
        let dir = TempDir::new().unwrap();
        let dest = write(&dir, "dest", "x");
        let meta = fs::metadata(&dest).unwrap();

        let mut file = DesiredFile::new(&dest);
        file.add_destination(&dest).unwrap();
        file.owner = Some(Principal::new("me", meta.uid()));
        file.group = Some(Principal::new("mine", meta.gid()));
        assert!(matches!(needs_owner_fix(&Arc::new(file.clone())), Probe::InSync));

        file.group = Some(Principal::new("other", meta.gid().wrapping_add(1)));
        let action = needs_owner_fix(&Arc::new(file)).into_action().unwrap();
        assert_eq!(action.command.get_args()[0], "me:other");
    }

    #[test]
    fn test_mode_unset_never_acts() {
        let dir = TempDir::new().unwrap();
        let source = write(&dir, "src", "x");
        assert!(matches!(
            needs_mode_fix(&copy_of(&source, &dir.path().join("missing"))),
            Probe::NotApplicable
        ));
        assert!(matches!(
            needs_mode_fix(&copy_of(&source, &source)),
            Probe::NotApplicable
        ));
    }

    #[test]
    fn test_mode_compares_bits() {
        let dir = TempDir::new().unwrap();
        let dest = write(&dir, "dest", "x");
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o640)).unwrap();

        let mut file = DesiredFile::new(&dest);
        file.add_destination(&dest).unwrap();
        file.add_mode("0640").unwrap();
        assert!(matches!(needs_mode_fix(&Arc::new(file.clone())), Probe::InSync));

        file.add_mode("0644").unwrap();
        let action = needs_mode_fix(&Arc::new(file)).into_action().unwrap();
        assert_eq!(action.cause, Cause::Mode);
        assert_eq!(action.command.get_args()[0], "0644");
    }
}
