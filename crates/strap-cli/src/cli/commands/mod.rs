//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod install;
mod register_path;
mod resolve;

pub use checksum::run_checksum;
pub use completions::{run_completions, run_man};
pub use install::run_install;
pub use register_path::run_register_path;
pub use resolve::run_resolve;

use strap_core::config::StrapConfig;
use strap_core::release::GitHubReleases;

/// Releases API client honoring the configured timeouts and `GITHUB_TOKEN`.
fn release_source(cfg: &StrapConfig) -> GitHubReleases {
    GitHubReleases::new(&cfg.api_base, cfg.timeouts.connect(), cfg.timeouts.transfer())
        .with_env_token()
}
