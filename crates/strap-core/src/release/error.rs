//! Release resolution errors.

use std::time::Duration;

/// Why no asset could be chosen.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("no releases published for {repo}")]
    NoReleases { repo: String },

    #[error("release {tag} has no asset matching '{pattern}' (assets: {})", list_or_none(.available))]
    NoMatchingAsset {
        tag: String,
        pattern: String,
        available: Vec<String>,
    },

    #[error("asset '{asset}' in release {tag} has no usable file name (url: {url})")]
    InvalidAssetName {
        tag: String,
        asset: String,
        url: String,
    },

    #[error("invalid asset pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("releases request to {url} returned HTTP {status}")]
    Http { url: String, status: u32 },

    #[error("releases request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("releases request to {url} timed out after {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("releases response from {url} is not a release list: {reason}")]
    Malformed { url: String, reason: String },

    #[error("asset template '{template}' is unusable: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("cannot build asset URL from '{base}': {reason}")]
    InvalidUrl { base: String, reason: String },
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
