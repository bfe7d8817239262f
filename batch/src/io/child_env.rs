//! Environment overrides handed to every feature-dump child.
//!
//! The driver's own environment is never mutated; the child inherits it and
//! receives the overrides computed here.

use std::env;
use std::ffi::{OsStr, OsString};
use std::iter;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// Immutable set of variables applied on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEnv {
    vars: Vec<(OsString, OsString)>,
}

impl ChildEnv {
    /// Prepend `dir` to the search path variable `var`, reading its current
    /// value from the driver's environment.
    pub fn with_library_dir(var: &str, dir: &Path) -> Result<Self> {
        Self::with_library_dir_from(var, dir, env::var_os(var).as_deref())
    }

    /// Same as [`ChildEnv::with_library_dir`] with an explicit current value.
    ///
    /// An unset variable becomes exactly `dir`; a set one (even empty) becomes
    /// `dir` joined with the existing entries.
    pub fn with_library_dir_from(var: &str, dir: &Path, current: Option<&OsStr>) -> Result<Self> {
        let value = match current {
            Some(existing) => {
                let entries = iter::once(dir.to_path_buf()).chain(env::split_paths(existing));
                env::join_paths(entries)
                    .with_context(|| format!("join {var} with {}", dir.display()))?
            }
            None => dir.as_os_str().to_owned(),
        };
        Ok(Self {
            vars: vec![(OsString::from(var), value)],
        })
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    pub fn apply(&self, cmd: &mut Command) {
        cmd.envs(self.vars.iter().map(|(k, v)| (k, v)));
    }
}
