//! Asset download with ordered fallback strategies.
//!
//! A [`Transport`] tries each [`FetchStrategy`] in turn. Whatever a strategy
//! reports, the destination is checked afterwards: it must exist and be
//! non-empty. External commands can exit 0 without writing anything, so their
//! own success signal is never taken on trust.

mod command;
mod error;
mod http;

pub use command::CommandFetch;
pub use error::{classify_curl_error, AttemptFailure, TransportError};
pub use http::{temp_path, HttpFetch};

use crate::config::{FallbackConfig, TimeoutConfig};
use std::fs;
use std::path::Path;

/// One way of downloading a URL to a local file.
pub trait FetchStrategy: Send + Sync {
    /// Short label used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Download `url` to `dest`, replacing any existing file.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), TransportError>;
}

/// Which strategy produced the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub strategy: String,
    pub bytes: u64,
    /// Failed attempts before the successful one.
    pub failed_attempts: usize,
}

/// Ordered list of strategies; the first one that leaves a non-empty file wins.
pub struct Transport {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl Transport {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Built-in HTTP client first, then (if enabled) the external command.
    pub fn from_config(timeouts: &TimeoutConfig, fallback: &FallbackConfig) -> Self {
        let mut strategies: Vec<Box<dyn FetchStrategy>> = vec![Box::new(HttpFetch::new(
            timeouts.connect(),
            timeouts.transfer(),
            timeouts.low_speed(),
        ))];
        if fallback.enabled {
            let command = match &fallback.command {
                Some(argv) => CommandFetch::from_argv(argv, timeouts.command()),
                None => Some(CommandFetch::platform_default(timeouts.command())),
            };
            match command {
                Some(c) => strategies.push(Box::new(c)),
                None => tracing::warn!("fallback command is empty; fallback disabled"),
            }
        }
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Downloads `url` to `dest`, falling through strategies until one passes the
    /// post-condition check.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, TransportError> {
        if self.strategies.is_empty() {
            return Err(TransportError::NoStrategies);
        }

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            tracing::info!(strategy = strategy.name(), url, dest = %dest.display(), "download attempt");
            // A leftover from an earlier run must not satisfy the post-check.
            if let Err(e) = remove_stale(dest) {
                failures.push(AttemptFailure {
                    strategy: strategy.name().to_string(),
                    error: e,
                });
                continue;
            }
            let attempt = strategy
                .fetch(url, dest)
                .and_then(|()| verify_destination(dest));
            match attempt {
                Ok(bytes) => {
                    tracing::info!(strategy = strategy.name(), bytes, "download complete");
                    return Ok(FetchOutcome {
                        strategy: strategy.name().to_string(),
                        bytes,
                        failed_attempts: failures.len(),
                    });
                }
                Err(error) => {
                    tracing::warn!(strategy = strategy.name(), %error, "download attempt failed");
                    failures.push(AttemptFailure {
                        strategy: strategy.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(TransportError::Exhausted {
            url: url.to_string(),
            failures,
        })
    }
}

fn remove_stale(dest: &Path) -> Result<(), TransportError> {
    match fs::remove_file(dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransportError::Io {
            path: dest.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Post-condition: `dest` is a regular file with at least one byte. Returns its size.
pub fn verify_destination(dest: &Path) -> Result<u64, TransportError> {
    match fs::metadata(dest) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(TransportError::MissingOrEmpty {
            path: dest.display().to_string(),
        }),
    }
}
