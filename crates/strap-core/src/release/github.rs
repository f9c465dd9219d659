//! GitHub releases API client.
//!
//! Uses the curl crate (libcurl) for a single blocking GET of the releases list.

use super::{Release, ReleaseSource, ResolutionError};
use std::time::Duration;

const USER_AGENT: &str = concat!("strap/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: u32 = 20;

/// Lists releases through `{api_base}/repos/{org}/{repo}/releases`.
#[derive(Debug, Clone)]
pub struct GitHubReleases {
    api_base: String,
    token: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl GitHubReleases {
    pub fn new(api_base: &str, connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            api_base: api_base.to_string(),
            token: None,
            connect_timeout,
            timeout,
        }
    }

    /// Picks up `GITHUB_TOKEN` for authenticated (higher rate limit) requests.
    pub fn with_env_token(mut self) -> Self {
        self.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty());
        self
    }

    /// Releases list URL for `org/repo`.
    pub fn releases_url(&self, org: &str, repo: &str) -> Result<String, ResolutionError> {
        let mut url = url::Url::parse(&self.api_base).map_err(|e| ResolutionError::InvalidUrl {
            base: self.api_base.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ResolutionError::InvalidUrl {
                base: self.api_base.clone(),
                reason: "base cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["repos", org, repo, "releases"]);
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string());
        Ok(url.to_string())
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, ResolutionError> {
        let request_err = |e: curl::Error| {
            if e.is_operation_timedout() {
                ResolutionError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                }
            } else {
                ResolutionError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(request_err)?;
        easy.follow_location(true).map_err(request_err)?;
        easy.useragent(USER_AGENT).map_err(request_err)?;
        easy.connect_timeout(self.connect_timeout).map_err(request_err)?;
        easy.timeout(self.timeout).map_err(request_err)?;

        let mut list = curl::easy::List::new();
        list.append("Accept: application/vnd.github+json").map_err(request_err)?;
        list.append("X-GitHub-Api-Version: 2022-11-28").map_err(request_err)?;
        if let Some(token) = &self.token {
            list.append(&format!("Authorization: Bearer {}", token.trim()))
                .map_err(request_err)?;
        }
        easy.http_headers(list).map_err(request_err)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(request_err)?;
            transfer.perform().map_err(request_err)?;
        }

        let code = easy.response_code().map_err(request_err)?;
        if !(200..300).contains(&code) {
            return Err(ResolutionError::Http {
                url: url.to_string(),
                status: code,
            });
        }
        Ok(body)
    }
}

impl ReleaseSource for GitHubReleases {
    fn list_releases(&self, org: &str, repo: &str) -> Result<Vec<Release>, ResolutionError> {
        let url = self.releases_url(org, repo)?;
        tracing::debug!(%url, "listing releases");
        let body = self.get(&url)?;
        let releases: Vec<Release> =
            serde_json::from_slice(&body).map_err(|e| ResolutionError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(count = releases.len(), "releases listed");
        Ok(releases)
    }
}
