use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::path_env::Scope;
use crate::verify::DEFAULT_VERSION_FLAG;

/// Timeouts applied to every network and process step (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// TCP/TLS connect timeout for HTTP requests.
    pub connect_secs: u64,
    /// Upper bound on a whole HTTP transfer (API call or asset download).
    pub transfer_secs: u64,
    /// Abort a download that stays below 1 KiB/s for this long.
    pub low_speed_secs: u64,
    /// Wall-clock limit for the external fallback download command.
    pub command_secs: u64,
    /// Wall-clock limit for the installed binary's version check.
    pub verify_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            transfer_secs: 600,
            low_speed_secs: 60,
            command_secs: 600,
            verify_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn transfer(&self) -> Duration {
        Duration::from_secs(self.transfer_secs)
    }

    pub fn low_speed(&self) -> Duration {
        Duration::from_secs(self.low_speed_secs)
    }

    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn verify(&self) -> Duration {
        Duration::from_secs(self.verify_secs)
    }
}

/// Fallback download strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Try an external download command when the built-in HTTP client fails.
    pub enabled: bool,
    /// Program and arguments; `{url}` and `{dest}` are substituted. None = platform default.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

/// Global configuration loaded from `~/.config/strap/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrapConfig {
    /// Owner of the repository publishing releases.
    pub org: String,
    /// Repository publishing releases.
    pub repo: String,
    /// Executable name inside the release archive (without `.exe`).
    pub binary: String,
    /// "latest" or an explicit release tag such as "v0.9.0".
    pub version: String,
    /// Which PATH value is extended: "user" or "machine".
    pub scope: Scope,
    /// Install directory; None = platform default for the scope.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
    /// Glob matched against asset names in latest mode; None = host platform default.
    #[serde(default)]
    pub asset_pattern: Option<String>,
    /// File name template for pinned versions. Placeholders: {binary} {version} {target} {ext}.
    pub pinned_asset_template: String,
    /// Base URL of the releases API.
    pub api_base: String,
    /// Base URL for pinned release downloads.
    pub download_base: String,
    /// Flag passed to the installed binary to check that it runs.
    pub version_flag: String,
    /// Expected SHA-256 (hex) of the archive. Checked before extraction when set.
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Default for StrapConfig {
    fn default() -> Self {
        Self {
            org: "aequitas".to_string(),
            repo: "aeq-cac".to_string(),
            binary: "aeq-cac".to_string(),
            version: "latest".to_string(),
            scope: Scope::User,
            install_dir: None,
            asset_pattern: None,
            pinned_asset_template: "{binary}-{target}-{version}.{ext}".to_string(),
            api_base: "https://api.github.com".to_string(),
            download_base: "https://github.com".to_string(),
            version_flag: DEFAULT_VERSION_FLAG.to_string(),
            sha256: None,
            timeouts: TimeoutConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

#[cfg(unix)]
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("strap")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

#[cfg(not(unix))]
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("no per-user config directory on this platform")?;
    Ok(dir.join("strap").join("config.toml"))
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<StrapConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, creating it with defaults if it does not exist.
pub fn load_or_init_at(path: &Path) -> Result<StrapConfig> {
    if !path.exists() {
        let default_cfg = StrapConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StrapConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = StrapConfig::default();
        assert_eq!(cfg.version, "latest");
        assert_eq!(cfg.scope, Scope::User);
        assert_eq!(cfg.version_flag, "--version");
        assert!(cfg.fallback.enabled);
        assert!(cfg.sha256.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = StrapConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: StrapConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.org, cfg.org);
        assert_eq!(parsed.repo, cfg.repo);
        assert_eq!(parsed.pinned_asset_template, cfg.pinned_asset_template);
        assert_eq!(parsed.timeouts.transfer_secs, cfg.timeouts.transfer_secs);
    }

    #[test]
    fn config_toml_pinned_machine_scope() {
        let toml = r#"
            org = "acme"
            repo = "migrator"
            binary = "migrator"
            version = "v1.2.3"
            scope = "machine"
            install_dir = "/opt/migrator"
            pinned_asset_template = "{binary}-{version}.zip"
            api_base = "https://api.github.com"
            download_base = "https://github.com"
            version_flag = "-V"
        "#;
        let cfg: StrapConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.version, "v1.2.3");
        assert_eq!(cfg.scope, Scope::Machine);
        assert_eq!(cfg.install_dir.as_deref(), Some(Path::new("/opt/migrator")));
        assert_eq!(cfg.timeouts.verify_secs, 30);
        assert!(cfg.fallback.command.is_none());
    }

    #[test]
    fn config_toml_timeouts_and_fallback() {
        let toml = r#"
            org = "acme"
            repo = "migrator"
            binary = "migrator"
            version = "latest"
            scope = "user"
            pinned_asset_template = "{binary}-{version}.zip"
            api_base = "http://127.0.0.1:9"
            download_base = "http://127.0.0.1:9"
            version_flag = "--version"
            sha256 = "abc123"

            [timeouts]
            connect_secs = 5
            transfer_secs = 60
            low_speed_secs = 10
            command_secs = 90
            verify_secs = 3

            [fallback]
            enabled = false
            command = ["wget", "-q", "-O", "{dest}", "{url}"]
        "#;
        let cfg: StrapConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.timeouts.verify(), Duration::from_secs(3));
        assert_eq!(cfg.timeouts.command(), Duration::from_secs(90));
        assert!(!cfg.fallback.enabled);
        assert_eq!(cfg.fallback.command.as_ref().unwrap()[0], "wget");
        assert_eq!(cfg.sha256.as_deref(), Some("abc123"));
    }

    #[test]
    fn load_or_init_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.binary, "aeq-cac");
        let again = load_or_init_at(&path).unwrap();
        assert_eq!(again.repo, cfg.repo);
    }
}
