//! Persisted PATH registration.
//!
//! The registrar reads a scope's PATH-like value through a [`PathStore`], tests
//! membership segment by segment (never by substring), and appends the install
//! directory only when it is missing. Stores hide where the value lives: the
//! Windows registry, a managed block in a shell profile, or memory for tests.

mod memory;
#[cfg(unix)]
mod profile;
#[cfg(windows)]
mod registry;

pub use memory::MemoryPathStore;
#[cfg(unix)]
pub use profile::ProfilePathStore;
#[cfg(windows)]
pub use registry::RegistryPathStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Whose PATH is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The invoking user's environment.
    #[default]
    User,
    /// The machine-wide environment (needs elevated rights).
    Machine,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User => write!(f, "user"),
            Scope::Machine => write!(f, "machine"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Scope::User),
            "machine" | "system" => Ok(Scope::Machine),
            other => Err(format!("unknown scope '{other}' (expected user or machine)")),
        }
    }
}

/// Failure to read or persist a PATH value.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("cannot read {scope} PATH from {location}: {reason}")]
    Read {
        scope: Scope,
        location: String,
        reason: String,
    },
    #[error("cannot write {scope} PATH to {location}: {reason}")]
    Write {
        scope: Scope,
        location: String,
        reason: String,
    },
    #[error("install directory is not valid unicode: {0}")]
    NonUnicodeDir(String),
    #[error("install directory contains the PATH delimiter '{delimiter}': {dir}")]
    DelimiterInDir { dir: String, delimiter: char },
}

/// Outcome of [`register_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The directory was appended and the new value persisted.
    Added,
    /// The directory was already a segment; nothing was written.
    AlreadyPresent,
}

/// How a store splits and compares PATH segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSyntax {
    pub delimiter: char,
    pub case_insensitive: bool,
}

impl PathSyntax {
    pub const WINDOWS: PathSyntax = PathSyntax {
        delimiter: ';',
        case_insensitive: true,
    };
    pub const UNIX: PathSyntax = PathSyntax {
        delimiter: ':',
        case_insensitive: false,
    };

    /// Syntax of the host platform.
    pub fn host() -> PathSyntax {
        if cfg!(windows) {
            PathSyntax::WINDOWS
        } else {
            PathSyntax::UNIX
        }
    }

    /// Non-empty segments of `value`, in order.
    pub fn segments<'a>(&self, value: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let delimiter = self.delimiter;
        value
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Exact segment membership. A single trailing separator on either side is ignored.
    pub fn contains(&self, value: &str, dir: &str) -> bool {
        let want = normalize_segment(dir);
        self.segments(value).any(|seg| {
            let seg = normalize_segment(seg);
            if self.case_insensitive {
                seg.eq_ignore_ascii_case(want)
            } else {
                seg == want
            }
        })
    }

    /// `value` with `dir` appended as a new segment.
    pub fn append(&self, value: &str, dir: &str) -> String {
        let trimmed = value.trim_end();
        if trimmed.is_empty() {
            dir.to_string()
        } else if trimmed.ends_with(self.delimiter) {
            format!("{trimmed}{dir}")
        } else {
            format!("{trimmed}{}{dir}", self.delimiter)
        }
    }
}

fn normalize_segment(seg: &str) -> &str {
    let trimmed = seg.trim();
    if trimmed.len() > 1 {
        let stripped = trimmed
            .strip_suffix('/')
            .or_else(|| trimmed.strip_suffix('\\'))
            .unwrap_or(trimmed);
        // "C:\" must keep its separator to stay a root.
        if stripped.ends_with(':') {
            trimmed
        } else {
            stripped
        }
    } else {
        trimmed
    }
}

/// Persisted PATH-like value, keyed by scope.
pub trait PathStore {
    /// Current value at `scope`; an absent value reads as the empty string.
    fn get(&self, scope: Scope) -> Result<String, RegistrationError>;

    /// Replace the value at `scope`.
    fn set(&self, scope: Scope, value: &str) -> Result<(), RegistrationError>;

    /// Segment rules for this store.
    fn syntax(&self) -> PathSyntax {
        PathSyntax::host()
    }
}

/// Adds `install_dir` to the PATH value at `scope` unless it is already a segment.
pub fn register_path<S: PathStore + ?Sized>(
    store: &S,
    install_dir: &Path,
    scope: Scope,
) -> Result<Registration, RegistrationError> {
    let syntax = store.syntax();
    let dir = install_dir
        .to_str()
        .ok_or_else(|| RegistrationError::NonUnicodeDir(install_dir.display().to_string()))?;
    if dir.contains(syntax.delimiter) {
        return Err(RegistrationError::DelimiterInDir {
            dir: dir.to_string(),
            delimiter: syntax.delimiter,
        });
    }

    let current = store.get(scope)?;
    if syntax.contains(&current, dir) {
        tracing::debug!(%scope, dir, "install directory already on PATH");
        return Ok(Registration::AlreadyPresent);
    }

    let updated = syntax.append(&current, dir);
    store.set(scope, &updated)?;
    tracing::info!(%scope, dir, "appended install directory to PATH");
    Ok(Registration::Added)
}

/// Persistent store for the host platform.
#[cfg(windows)]
pub fn host_store(_binary: &str) -> Box<dyn PathStore> {
    Box::new(RegistryPathStore::new())
}

/// Persistent store for the host platform.
#[cfg(unix)]
pub fn host_store(binary: &str) -> Box<dyn PathStore> {
    Box::new(ProfilePathStore::for_host(binary))
}
