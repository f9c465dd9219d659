//! Download error type and curl error classification.

use std::fmt;
use std::time::Duration;

/// One strategy's failed attempt, kept for the final diagnostic.
#[derive(Debug)]
pub struct AttemptFailure {
    pub strategy: String,
    pub error: TransportError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connect, transfer, low-speed or command deadline exceeded.
    #[error("timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("server returned HTTP {status} for {url}")]
    Http { url: String, status: u32 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("{program} exited with {}: {}", exit_label(.code), stderr_tail(.stderr))]
    Command {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot run {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{path}: {reason}")]
    Io { path: String, reason: String },

    /// Post-condition failed: the strategy finished but left no usable file.
    #[error("{path} is missing or empty after download")]
    MissingOrEmpty { path: String },

    #[error("no download strategy configured")]
    NoStrategies,

    #[error("all download strategies failed for {url}: {}", join_failures(.failures))]
    Exhausted {
        url: String,
        failures: Vec<AttemptFailure>,
    },
}

impl TransportError {
    /// True when this error, or every attempt it aggregates, is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout { .. } => true,
            TransportError::Exhausted { failures, .. } => {
                !failures.is_empty() && failures.iter().all(|f| f.error.is_timeout())
            }
            _ => false,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

fn stderr_tail(stderr: &str) -> String {
    let line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.is_empty() {
        "(no output)".to_string()
    } else {
        line.trim().to_string()
    }
}

fn join_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Maps a curl failure onto the transport taxonomy, keeping timeouts distinct.
pub fn classify_curl_error(e: &curl::Error, timeout: Duration) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::Timeout { after: timeout };
    }
    TransportError::Request(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_lists_every_attempt() {
        let err = TransportError::Exhausted {
            url: "https://h/a.zip".to_string(),
            failures: vec![
                AttemptFailure {
                    strategy: "http".to_string(),
                    error: TransportError::Http {
                        url: "https://h/a.zip".to_string(),
                        status: 404,
                    },
                },
                AttemptFailure {
                    strategy: "curl".to_string(),
                    error: TransportError::Command {
                        program: "curl".to_string(),
                        code: Some(22),
                        stderr: "curl: (22) The requested URL returned error: 404\n".to_string(),
                    },
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("http: server returned HTTP 404"));
        assert!(msg.contains("curl: curl exited with status 22: curl: (22)"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_detection_over_attempts() {
        let all_timeouts = TransportError::Exhausted {
            url: "u".to_string(),
            failures: vec![AttemptFailure {
                strategy: "http".to_string(),
                error: TransportError::Timeout {
                    after: Duration::from_secs(3),
                },
            }],
        };
        assert!(all_timeouts.is_timeout());
        assert!(!TransportError::Exhausted {
            url: "u".to_string(),
            failures: vec![]
        }
        .is_timeout());
    }

    #[test]
    fn command_without_stderr() {
        let err = TransportError::Command {
            program: "wget".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "wget exited with a signal: (no output)");
    }
}
