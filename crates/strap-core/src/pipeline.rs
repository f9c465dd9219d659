//! The install pipeline: resolve, download, extract, verify, register.
//!
//! Stages run strictly in order and the first failure ends the run. Nothing is
//! rolled back; a rerun converges because extraction overwrites and PATH
//! registration checks segments before writing.

use crate::archive::{self, ArchiveError};
use crate::config::StrapConfig;
use crate::error::{InstallError, Stage};
use crate::path_env::{self, PathStore, Registration, Scope};
use crate::platform;
use crate::release::{self, AssetDescriptor, AssetQuery, ReleaseSource, VersionSelector};
use crate::transport::{FetchOutcome, Transport};
use crate::verify;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved inputs for one run.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub query: AssetQuery,
    pub scope: Scope,
    pub install_dir: PathBuf,
    pub version_flag: String,
    pub sha256: Option<String>,
    pub verify_timeout: Duration,
    /// When false the PATH stage is skipped entirely.
    pub register_path: bool,
}

impl InstallPlan {
    /// Fills platform defaults (asset pattern, install dir) from `cfg`.
    pub fn from_config(cfg: &StrapConfig) -> Result<Self> {
        let version: VersionSelector = cfg
            .version
            .parse()
            .map_err(|e: String| anyhow!("invalid version in config: {e}"))?;
        let install_dir = match &cfg.install_dir {
            Some(dir) => dir.clone(),
            None => platform::default_install_dir(&cfg.binary, cfg.scope).ok_or_else(|| {
                anyhow!(
                    "no default {} install directory on this platform; set install_dir",
                    cfg.scope
                )
            })?,
        };
        Ok(Self {
            query: AssetQuery {
                org: cfg.org.clone(),
                repo: cfg.repo.clone(),
                binary: cfg.binary.clone(),
                pattern: cfg
                    .asset_pattern
                    .clone()
                    .unwrap_or_else(platform::default_asset_pattern),
                version,
                pinned_template: cfg.pinned_asset_template.clone(),
                download_base: cfg.download_base.clone(),
            },
            scope: cfg.scope,
            install_dir,
            version_flag: cfg.version_flag.clone(),
            sha256: cfg.sha256.clone().filter(|s| !s.trim().is_empty()),
            verify_timeout: cfg.timeouts.verify(),
            register_path: true,
        })
    }

    pub fn executable_name(&self) -> String {
        platform::executable_name(&self.query.binary)
    }
}

/// Progress notifications, one or more per stage.
#[derive(Debug, Clone)]
pub enum StageEvent {
    Started(Stage),
    Resolved(AssetDescriptor),
    Downloaded { path: PathBuf, outcome: FetchOutcome },
    Extracted { executable: PathBuf },
    Verified { version: String },
    Registered { dir: PathBuf, scope: Scope, registration: Registration },
    PathSkipped,
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub tag: String,
    pub asset: String,
    pub executable: PathBuf,
    /// First line of the binary's version output.
    pub reported_version: String,
    /// None when registration was skipped.
    pub registration: Option<Registration>,
}

/// Wires the pipeline's collaborators together.
pub struct Installer<'a> {
    source: &'a dyn ReleaseSource,
    transport: &'a Transport,
    store: &'a dyn PathStore,
}

impl<'a> Installer<'a> {
    pub fn new(source: &'a dyn ReleaseSource, transport: &'a Transport, store: &'a dyn PathStore) -> Self {
        Self {
            source,
            transport,
            store,
        }
    }

    /// Runs every stage in order, reporting progress through `on_event`.
    pub fn run(
        &self,
        plan: &InstallPlan,
        on_event: &mut dyn FnMut(&StageEvent),
    ) -> Result<InstallReport, InstallError> {
        // The directory must exist before anything is downloaded into it.
        archive::ensure_install_dir(&plan.install_dir)?;

        on_event(&StageEvent::Started(Stage::Resolve));
        let descriptor = release::resolve_asset(self.source, &plan.query)?;
        on_event(&StageEvent::Resolved(descriptor.clone()));

        on_event(&StageEvent::Started(Stage::Download));
        let archive_path = plan.install_dir.join(&descriptor.file_name);
        let outcome = self.transport.fetch(&descriptor.url, &archive_path)?;
        on_event(&StageEvent::Downloaded {
            path: archive_path.clone(),
            outcome,
        });

        on_event(&StageEvent::Started(Stage::Extract));
        let exe_name = plan.executable_name();
        if descriptor.file_name == exe_name {
            return Err(ArchiveError::Unsupported {
                path: archive_path.display().to_string(),
            }
            .into());
        }
        let executable = archive::install(
            &archive_path,
            &plan.install_dir,
            &exe_name,
            plan.sha256.as_deref(),
        )?;
        on_event(&StageEvent::Extracted {
            executable: executable.clone(),
        });

        on_event(&StageEvent::Started(Stage::Verify));
        let reported_version = verify::verify(&executable, &plan.version_flag, plan.verify_timeout)?;
        on_event(&StageEvent::Verified {
            version: reported_version.clone(),
        });

        let registration = if plan.register_path {
            on_event(&StageEvent::Started(Stage::RegisterPath));
            let registration = path_env::register_path(self.store, &plan.install_dir, plan.scope)?;
            on_event(&StageEvent::Registered {
                dir: plan.install_dir.clone(),
                scope: plan.scope,
                registration,
            });
            Some(registration)
        } else {
            on_event(&StageEvent::PathSkipped);
            None
        };

        tracing::info!(
            tag = %descriptor.tag,
            exe = %executable.display(),
            version = %reported_version,
            "install complete"
        );
        Ok(InstallReport {
            tag: descriptor.tag,
            asset: descriptor.file_name,
            executable,
            reported_version,
            registration,
        })
    }
}
