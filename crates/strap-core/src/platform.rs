//! Host platform conventions: asset naming, executable suffix, default install roots.

use crate::path_env::Scope;
use std::path::PathBuf;

/// Label embedded in release asset names for the host platform.
///
/// Matches the naming used by the release workflow, e.g. `tool-windows-gnu-v0.9.0.zip`.
pub fn target_label() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows-gnu"
    } else if cfg!(target_os = "macos") {
        "apple-darwin"
    } else {
        "linux-gnu"
    }
}

/// Archive extension published for the host platform (without leading dot).
pub fn archive_ext() -> &'static str {
    if cfg!(target_os = "windows") {
        "zip"
    } else {
        "tar.gz"
    }
}

/// File name of the installed executable (`aeq-cac` → `aeq-cac.exe` on Windows).
pub fn executable_name(binary: &str) -> String {
    if cfg!(target_os = "windows") && !binary.to_ascii_lowercase().ends_with(".exe") {
        format!("{binary}.exe")
    } else {
        binary.to_string()
    }
}

/// Glob used to pick the host asset out of a release when none is configured.
pub fn default_asset_pattern() -> String {
    format!("*{}*.{}", target_label(), archive_ext())
}

/// Default install directory for `binary` at `scope`.
///
/// User scope lives under the per-user application data root; machine scope under
/// `%ProgramFiles%` on Windows and `/opt` elsewhere. Returns `None` when the
/// platform does not expose the needed root.
pub fn default_install_dir(binary: &str, scope: Scope) -> Option<PathBuf> {
    match scope {
        Scope::User => dirs::data_local_dir().map(|d| d.join(binary)),
        Scope::Machine => machine_root().map(|d| d.join(binary)),
    }
}

#[cfg(windows)]
fn machine_root() -> Option<PathBuf> {
    std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(r"C:\Program Files")))
}

#[cfg(not(windows))]
fn machine_root() -> Option<PathBuf> {
    Some(PathBuf::from("/opt"))
}

/// Whether the current process can be expected to write machine-scope state.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Whether the current process can be expected to write machine-scope state.
///
/// Elevation is not probed on this platform; the registry write reports access errors.
#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    true
}
