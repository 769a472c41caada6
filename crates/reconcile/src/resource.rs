//! Desired state of one declared configuration target
//!
//! A [`DesiredFile`] is built incrementally from declarations, then frozen
//! behind an `Arc` once validated. Planning only ever reads it.

use crate::error::{Error, Result};
use crate::principal::{self, Principal};
use crate::types::Cmd;
use std::fmt;
use std::path::{Path, PathBuf};

/// Permission bits, kept in the declared octal text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode(String);

impl Mode {
    /// Validate an octal mode string such as "0644" or "755"
    pub fn parse(mode: &str) -> Result<Self> {
        // from_str_radix alone would accept a leading sign
        let octal = (1..=4).contains(&mode.len())
            && mode.bytes().all(|b| matches!(b, b'0'..=b'7'));
        if octal {
            Ok(Self(mode.to_string()))
        } else {
            Err(Error::InvalidMode {
                mode: mode.to_string(),
            })
        }
    }

    /// The declared text, as passed to chmod
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric permission bits
    pub fn bits(&self) -> std::result::Result<u32, std::num::ParseIntError> {
        u32::from_str_radix(&self.0, 8)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared configuration target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredFile {
    /// File whose content is propagated (or the symlink target)
    pub source: Option<PathBuf>,
    /// Where content, ownership and mode are applied, or where the symlink
    /// is created
    pub destination: Option<PathBuf>,
    /// Create `destination` as a symlink to `source` instead of copying
    pub is_link: bool,
    /// Directory that must exist (created with parents)
    pub directory: Option<PathBuf>,
    pub owner: Option<Principal>,
    pub group: Option<Principal>,
    pub mode: Option<Mode>,
    /// Required packages, in declaration order without duplicates
    pub packages: Vec<String>,
    /// Validation command; `source` is appended as its last argument
    pub pre: Option<Cmd>,
    /// Command run after any change to this target
    pub post: Option<Cmd>,
}

impl DesiredFile {
    /// Declaration whose content lives at `source`
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: Some(source.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Copy `source` to `dest`; the parent of `dest` becomes the directory to
    /// ensure.
    pub fn add_destination(&mut self, dest: impl AsRef<Path>) -> Result<()> {
        self.set_target(dest.as_ref(), false)
    }

    /// Link `dest` to `source`; the parent of `dest` becomes the directory to
    /// ensure.
    pub fn add_link(&mut self, dest: impl AsRef<Path>) -> Result<()> {
        self.set_target(dest.as_ref(), true)
    }

    fn set_target(&mut self, dest: &Path, link: bool) -> Result<()> {
        if self.destination.is_some() && self.is_link != link {
            return Err(Error::LinkAndCopy(dest.to_path_buf()));
        }

        self.destination = Some(dest.to_path_buf());
        self.is_link = link;
        self.directory = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(())
    }

    pub fn add_directory(&mut self, dir: impl AsRef<Path>) {
        self.directory = Some(dir.as_ref().to_path_buf());
    }

    /// Resolve and set the owning user
    pub fn add_owner(&mut self, name: &str) -> Result<()> {
        self.owner = Some(principal::lookup_user(name)?);
        Ok(())
    }

    /// Resolve and set the owning group
    pub fn add_group(&mut self, name: &str) -> Result<()> {
        self.group = Some(principal::lookup_group(name)?);
        Ok(())
    }

    /// Validate and set the permission bits
    pub fn add_mode(&mut self, mode: &str) -> Result<()> {
        self.mode = Some(Mode::parse(mode)?);
        Ok(())
    }

    pub fn add_package(&mut self, package: &str) {
        if !self.packages.iter().any(|p| p == package) {
            self.packages.push(package.to_string());
        }
    }

    /// Set the validation command; blank input clears it
    pub fn add_pre(&mut self, line: &str) {
        self.pre = Cmd::from_fields(line);
    }

    /// Set the post-update command; blank input clears it
    pub fn add_post(&mut self, line: &str) {
        self.post = Cmd::from_fields(line);
    }

    /// Whether content copy semantics apply
    pub fn wants_copy(&self) -> bool {
        !self.is_link && self.source.is_some() && self.destination.is_some()
    }

    /// Name used in logs: the source if any, else the destination
    pub fn label(&self) -> String {
        self.source
            .as_ref()
            .or(self.destination.as_ref())
            .or(self.directory.as_ref())
            .map_or_else(|| "<packages>".to_string(), |p| p.display().to_string())
    }
}
