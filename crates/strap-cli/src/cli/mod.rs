//! CLI for the strap release installer.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use strap_core::config::{self, StrapConfig};
use strap_core::logging;
use strap_core::path_env::Scope;
use std::path::PathBuf;

use commands::{
    run_checksum, run_completions, run_install, run_man, run_register_path, run_resolve,
};

/// Top-level CLI for strap.
#[derive(Debug, Parser)]
#[command(name = "strap")]
#[command(about = "strap: download, verify and put a released CLI on PATH", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Release selection shared by `install` and `resolve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ReleaseArgs {
    /// "latest" or a release tag such as v0.9.0.
    #[arg(long, value_name = "V")]
    pub version: Option<String>,

    /// Glob matched against asset names (latest mode).
    #[arg(long, value_name = "P")]
    pub pattern: Option<String>,
}

impl ReleaseArgs {
    fn apply(&self, cfg: &mut StrapConfig) {
        if let Some(v) = &self.version {
            cfg.version = v.clone();
        }
        if let Some(p) = &self.pattern {
            cfg.asset_pattern = Some(p.clone());
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve, download, extract, verify and register the configured tool.
    Install {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Whose PATH to extend.
        #[arg(long, value_name = "user|machine")]
        scope: Option<Scope>,

        /// Install directory (default depends on scope).
        #[arg(long, value_name = "D")]
        dir: Option<PathBuf>,

        /// Expected SHA-256 of the downloaded archive.
        #[arg(long, value_name = "H")]
        sha256: Option<String>,

        /// Only use the built-in HTTP client; no external download command.
        #[arg(long)]
        no_fallback: bool,

        /// Leave PATH untouched.
        #[arg(long)]
        skip_path: bool,
    },

    /// Print which asset would be installed, without downloading it.
    Resolve {
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Add the install directory to PATH (idempotent).
    RegisterPath {
        /// Whose PATH to extend.
        #[arg(long, value_name = "user|machine")]
        scope: Option<Scope>,

        /// Directory to add (default: configured install directory).
        #[arg(long, value_name = "D")]
        dir: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file (e.g. a downloaded archive).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

fn load_config(path: Option<&PathBuf>) -> Result<StrapConfig> {
    match path {
        Some(p) => config::load_or_init_at(p),
        None => config::load_or_init(),
    }
}

fn init_logging(verbose: bool) {
    if verbose {
        logging::init_logging_stderr();
        return;
    }
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        init_logging(cli.verbose);

        // Output-only commands need no config.
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            CliCommand::Checksum { path } => return run_checksum(path),
            _ => {}
        }

        let mut cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Install {
                release,
                scope,
                dir,
                sha256,
                no_fallback,
                skip_path,
            } => {
                release.apply(&mut cfg);
                if let Some(s) = scope {
                    cfg.scope = s;
                }
                if dir.is_some() {
                    cfg.install_dir = dir;
                }
                if sha256.is_some() {
                    cfg.sha256 = sha256;
                }
                if no_fallback {
                    cfg.fallback.enabled = false;
                }
                run_install(&cfg, skip_path)?;
            }
            CliCommand::Resolve { release } => {
                release.apply(&mut cfg);
                run_resolve(&cfg)?;
            }
            CliCommand::RegisterPath { scope, dir } => {
                if let Some(s) = scope {
                    cfg.scope = s;
                }
                if dir.is_some() {
                    cfg.install_dir = dir;
                }
                run_register_path(&cfg)?;
            }
            CliCommand::Checksum { .. } | CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
