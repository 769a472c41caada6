//! User and group resolution through the system account databases

use crate::error::{Error, Result};
use nix::unistd::{Group, Uid, User};

/// A named user or group with its resolved numeric id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub id: u32,
}

impl Principal {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Resolve a user name to its uid
pub fn lookup_user(name: &str) -> Result<Principal> {
    match User::from_name(name) {
        Ok(Some(user)) => Ok(Principal::new(name, user.uid.as_raw())),
        Ok(None) => Err(Error::UnknownUser(name.to_string())),
        Err(e) => {
            log::debug!("passwd lookup for '{name}' failed: {e}");
            Err(Error::UnknownUser(name.to_string()))
        }
    }
}

/// Resolve a group name to its gid
pub fn lookup_group(name: &str) -> Result<Principal> {
    match Group::from_name(name) {
        Ok(Some(group)) => Ok(Principal::new(name, group.gid.as_raw())),
        Ok(None) => Err(Error::UnknownGroup(name.to_string())),
        Err(e) => {
            log::debug!("group lookup for '{name}' failed: {e}");
            Err(Error::UnknownGroup(name.to_string()))
        }
    }
}

/// Name of the user owning `uid`, for log messages
pub fn user_name(uid: u32) -> Option<String> {
    User::from_uid(Uid::from_raw(uid))
        .ok()
        .flatten()
        .map(|user| user.name)
}
