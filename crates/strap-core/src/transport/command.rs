//! Fallback download through an external program (curl, PowerShell, or configured).

use super::{FetchStrategy, TransportError};
use crate::process::{run_with_timeout, ProcessError};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Environment variable holding the URL for scripted downloaders.
pub const URL_ENV: &str = "STRAP_FETCH_URL";
/// Environment variable holding the destination path for scripted downloaders.
pub const DEST_ENV: &str = "STRAP_FETCH_DEST";

/// Runs `program args...` with `{url}` and `{dest}` substituted in each argument.
///
/// The child also sees the URL and destination as [`URL_ENV`] and [`DEST_ENV`],
/// so scripts can read them without quoting them into their source.
#[derive(Debug, Clone)]
pub struct CommandFetch {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandFetch {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// `argv[0]` is the program. None when `argv` is empty.
    pub fn from_argv(argv: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), timeout))
    }

    /// The downloader the host is expected to ship.
    pub fn platform_default(timeout: Duration) -> Self {
        if cfg!(windows) {
            Self::powershell(timeout)
        } else {
            Self::new(
                "curl",
                ["-fsSL", "--retry", "2", "-o", "{dest}", "{url}"]
                    .map(String::from)
                    .to_vec(),
                timeout,
            )
        }
    }

    /// `Invoke-WebRequest` reading its inputs from the environment; paths with
    /// quotes never reach the PowerShell parser.
    pub fn powershell(timeout: Duration) -> Self {
        let script = format!(
            "$ProgressPreference='SilentlyContinue'; \
             Invoke-WebRequest -UseBasicParsing -Uri $env:{URL_ENV} -OutFile $env:{DEST_ENV}"
        );
        Self::new(
            "powershell",
            vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
                script,
            ],
            timeout,
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders filled in.
    pub fn expand_args(&self, url: &str, dest: &Path) -> Vec<String> {
        let dest = dest.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{url}", url).replace("{dest}", &dest))
            .collect()
    }
}

impl FetchStrategy for CommandFetch {
    fn name(&self) -> &str {
        &self.program
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let program = which::which(&self.program).map_err(|e| TransportError::Launch {
            program: self.program.clone(),
            reason: e.to_string(),
        })?;
        let args = self.expand_args(url, dest);
        tracing::debug!(program = %program.display(), ?args, "running fallback downloader");

        let mut cmd = Command::new(&program);
        cmd.args(&args).env(URL_ENV, url).env(DEST_ENV, dest);
        let out = run_with_timeout(&mut cmd, self.timeout).map_err(
            |e| match e {
                ProcessError::TimedOut(after) => TransportError::Timeout { after },
                other => TransportError::Launch {
                    program: self.program.clone(),
                    reason: other.to_string(),
                },
            },
        )?;

        if !out.status.success() {
            return Err(TransportError::Command {
                program: self.program.clone(),
                code: out.status.code(),
                stderr: out.stderr,
            });
        }
        Ok(())
    }
}
