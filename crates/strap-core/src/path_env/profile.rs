//! Shell-profile PATH store for Unix hosts.
//!
//! The persisted value is the entry list of a marked block:
//!
//! ```sh
//! # >>> aeq-cac PATH >>>
//! export PATH="$PATH:/home/me/.local/share/aeq-cac"
//! # <<< aeq-cac PATH <<<
//! ```
//!
//! User scope edits `~/.profile`; machine scope owns `/etc/profile.d/<binary>.sh`.
//! Lines outside the block are preserved byte for byte.

use super::{PathStore, PathSyntax, RegistrationError, Scope};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const EXPORT_PREFIX: &str = "export PATH=\"$PATH:";

#[derive(Debug, Clone)]
pub struct ProfilePathStore {
    user_file: Option<PathBuf>,
    machine_file: PathBuf,
    begin: String,
    end: String,
}

impl ProfilePathStore {
    /// Store using the conventional profile locations for `binary`.
    pub fn for_host(binary: &str) -> Self {
        Self::new(
            dirs::home_dir().map(|h| h.join(".profile")),
            PathBuf::from("/etc/profile.d").join(format!("{binary}.sh")),
            binary,
        )
    }

    /// Store with explicit profile files. `tag` names the managed block.
    pub fn new(user_file: Option<PathBuf>, machine_file: PathBuf, tag: &str) -> Self {
        Self {
            user_file,
            machine_file,
            begin: format!("# >>> {tag} PATH >>>"),
            end: format!("# <<< {tag} PATH <<<"),
        }
    }

    fn file_for(&self, scope: Scope) -> Result<&Path, String> {
        match scope {
            Scope::User => self
                .user_file
                .as_deref()
                .ok_or_else(|| "no home directory".to_string()),
            Scope::Machine => Ok(&self.machine_file),
        }
    }

    /// Line range `(begin, end)` of the managed block, both marker lines included.
    /// A begin marker with no end marker before the next begin is not a block.
    fn find_block(&self, lines: &[&str]) -> Option<(usize, usize)> {
        let mut open = None;
        for (i, line) in lines.iter().enumerate() {
            let line = line.trim();
            if line == self.begin {
                open = Some(i);
            } else if line == self.end {
                if let Some(start) = open {
                    return Some((start, i));
                }
            }
        }
        None
    }

    /// Entries inside the managed block of `contents`, or "" when there is no block.
    fn extract(&self, contents: &str) -> String {
        let lines: Vec<&str> = contents.lines().collect();
        let Some((start, end)) = self.find_block(&lines) else {
            return String::new();
        };
        lines[start + 1..end]
            .iter()
            .find_map(|line| line.trim().strip_prefix(EXPORT_PREFIX))
            .map(|rest| unescape(rest.strip_suffix('"').unwrap_or(rest)))
            .unwrap_or_default()
    }

    fn render_block(&self, value: &str) -> String {
        format!(
            "{}\n# Managed by strap; edits inside this block are overwritten.\n{}{}\"\n{}\n",
            self.begin,
            EXPORT_PREFIX,
            escape(value),
            self.end
        )
    }

    /// `contents` with the managed block replaced (or appended) to hold `value`.
    fn splice(&self, contents: &str, value: &str) -> String {
        let block = self.render_block(value);
        let lines: Vec<&str> = contents.split_inclusive('\n').collect();
        let mut out = String::with_capacity(contents.len() + block.len());

        if let Some((start, end)) = self.find_block(&lines) {
            out.extend(lines[..start].iter().copied());
            out.push_str(&block);
            out.extend(lines[end + 1..].iter().copied());
            return out;
        }

        out.push_str(contents);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&block);
        out
    }
}

/// Sibling file the new profile is written to before being renamed over `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".strap-tmp");
    path.with_file_name(name)
}

/// Writes `contents` next to `path` and renames it into place, keeping the old mode.
fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    let staging = staging_path(path);
    let result = (|| {
        fs::write(&staging, contents)?;
        match fs::metadata(path) {
            Ok(meta) => fs::set_permissions(&staging, meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::rename(&staging, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl PathStore for ProfilePathStore {
    fn get(&self, scope: Scope) -> Result<String, RegistrationError> {
        let path = self.file_for(scope).map_err(|reason| RegistrationError::Read {
            scope,
            location: "shell profile".to_string(),
            reason,
        })?;
        match fs::read_to_string(path) {
            Ok(contents) => Ok(self.extract(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(RegistrationError::Read {
                scope,
                location: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn set(&self, scope: Scope, value: &str) -> Result<(), RegistrationError> {
        let path = self.file_for(scope).map_err(|reason| RegistrationError::Write {
            scope,
            location: "shell profile".to_string(),
            reason,
        })?;
        let write_err = |e: io::Error| RegistrationError::Write {
            scope,
            location: path.display().to_string(),
            reason: e.to_string(),
        };
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(write_err(e)),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        replace_file(path, &self.splice(&contents, value)).map_err(write_err)?;
        tracing::debug!(path = %path.display(), %scope, "persisted PATH block");
        Ok(())
    }

    fn syntax(&self) -> PathSyntax {
        PathSyntax::UNIX
    }
}
