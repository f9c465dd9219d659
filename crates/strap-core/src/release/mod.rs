//! Release resolution: turns (org, repo, pattern, version) into one downloadable asset.
//!
//! Latest mode asks a [`ReleaseSource`] for the release list and trusts its
//! ordering: the first release is the newest, and the first asset whose name
//! matches the glob wins. Pinned mode builds the download URL from a file name
//! template and never touches the network.

mod error;
mod github;
mod naming;
mod pinned;

pub use error::ResolutionError;
pub use github::GitHubReleases;
pub use naming::{archive_file_name, filename_from_url_path, sanitize_file_name};
pub use pinned::{expand_template, pinned_descriptor};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A published release as returned by the releases API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

/// The chosen asset: where to download it from and what to call it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub url: String,
    pub file_name: String,
    pub tag: String,
}

/// Which release to install.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    #[default]
    Latest,
    Pinned(String),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Pinned(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("version must not be empty".to_string());
        }
        if s.eq_ignore_ascii_case("latest") {
            Ok(VersionSelector::Latest)
        } else {
            Ok(VersionSelector::Pinned(s.to_string()))
        }
    }
}

/// Everything needed to resolve one asset.
#[derive(Debug, Clone)]
pub struct AssetQuery {
    pub org: String,
    pub repo: String,
    pub binary: String,
    /// Glob matched against asset names (latest mode).
    pub pattern: String,
    pub version: VersionSelector,
    /// File name template (pinned mode).
    pub pinned_template: String,
    /// Base URL for pinned downloads, e.g. `https://github.com`.
    pub download_base: String,
}

/// Source of release listings, newest first.
pub trait ReleaseSource {
    fn list_releases(&self, org: &str, repo: &str) -> Result<Vec<Release>, ResolutionError>;
}

/// Release list held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticReleases(pub Vec<Release>);

impl ReleaseSource for StaticReleases {
    fn list_releases(&self, _org: &str, _repo: &str) -> Result<Vec<Release>, ResolutionError> {
        Ok(self.0.clone())
    }
}

/// First asset of `release` whose name matches `pattern`.
pub fn match_asset(release: &Release, pattern: &str) -> Result<AssetDescriptor, ResolutionError> {
    let glob = glob::Pattern::new(pattern).map_err(|e| ResolutionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let asset = release
        .assets
        .iter()
        .find(|a| glob.matches(&a.name))
        .ok_or_else(|| ResolutionError::NoMatchingAsset {
            tag: release.tag.clone(),
            pattern: pattern.to_string(),
            available: release.assets.iter().map(|a| a.name.clone()).collect(),
        })?;

    let file_name = archive_file_name(&asset.name, &asset.url).ok_or_else(|| {
        ResolutionError::InvalidAssetName {
            tag: release.tag.clone(),
            asset: asset.name.clone(),
            url: asset.url.clone(),
        }
    })?;

    Ok(AssetDescriptor {
        url: asset.url.clone(),
        file_name,
        tag: release.tag.clone(),
    })
}

/// Resolves `query` to a single asset.
pub fn resolve_asset<S: ReleaseSource + ?Sized>(
    source: &S,
    query: &AssetQuery,
) -> Result<AssetDescriptor, ResolutionError> {
    match &query.version {
        VersionSelector::Pinned(version) => {
            let descriptor = pinned_descriptor(query, version)?;
            tracing::info!(url = %descriptor.url, "pinned asset");
            Ok(descriptor)
        }
        VersionSelector::Latest => {
            let releases = source.list_releases(&query.org, &query.repo)?;
            let latest = releases.first().ok_or_else(|| ResolutionError::NoReleases {
                repo: format!("{}/{}", query.org, query.repo),
            })?;
            tracing::debug!(
                tag = %latest.tag,
                prerelease = latest.prerelease,
                assets = latest.assets.len(),
                "latest release"
            );
            let descriptor = match_asset(latest, &query.pattern)?;
            tracing::info!(tag = %descriptor.tag, url = %descriptor.url, "resolved asset");
            Ok(descriptor)
        }
    }
}
