//! Post-install check: the binary runs and reports a version.

use crate::process::{run_with_timeout, ProcessError};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

pub const DEFAULT_VERSION_FLAG: &str = "--version";

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Missing file, wrong architecture, missing shared library.
    #[error("cannot launch {path}: {reason}")]
    Launch { path: String, reason: String },

    #[error("{path} {flag} exited with {}: {}", status_label(.code), .stderr.trim())]
    NonZeroExit {
        path: String,
        flag: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{path} {flag} printed nothing on stdout")]
    NoOutput { path: String, flag: String },

    #[error("{path} {flag} did not finish within {}s", .after.as_secs())]
    Timeout {
        path: String,
        flag: String,
        after: Duration,
    },
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

/// Runs `exe <flag>` and returns the first non-empty stdout line, trimmed.
pub fn verify(exe: &Path, flag: &str, timeout: Duration) -> Result<String, VerificationError> {
    let path = exe.display().to_string();
    let mut cmd = Command::new(exe);
    if !flag.is_empty() {
        cmd.arg(flag);
    }

    let out = run_with_timeout(&mut cmd, timeout).map_err(|e| match e {
        ProcessError::TimedOut(after) => VerificationError::Timeout {
            path: path.clone(),
            flag: flag.to_string(),
            after,
        },
        other => VerificationError::Launch {
            path: path.clone(),
            reason: other.to_string(),
        },
    })?;

    if !out.status.success() {
        return Err(VerificationError::NonZeroExit {
            path,
            flag: flag.to_string(),
            code: out.status.code(),
            stderr: out.stderr,
        });
    }

    let version = out
        .stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| VerificationError::NoOutput {
            path: path.clone(),
            flag: flag.to_string(),
        })?;
    tracing::info!(exe = %path, version, "binary verified");
    Ok(version.to_string())
}
