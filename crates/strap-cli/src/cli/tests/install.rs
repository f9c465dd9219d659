use super::parse;
use crate::cli::{Cli, CliCommand, ReleaseArgs};
use clap::Parser;
use std::path::PathBuf;
use strap_core::config::StrapConfig;
use strap_core::path_env::Scope;

#[test]
fn cli_parse_install_defaults() {
    match parse(&["strap", "install"]) {
        CliCommand::Install {
            release,
            scope,
            dir,
            sha256,
            no_fallback,
            skip_path,
        } => {
            assert!(release.version.is_none());
            assert!(release.pattern.is_none());
            assert!(scope.is_none());
            assert!(dir.is_none());
            assert!(sha256.is_none());
            assert!(!no_fallback);
            assert!(!skip_path);
        }
        _ => panic!("expected Install"),
    }
}

#[test]
fn cli_parse_install_all_flags() {
    match parse(&[
        "strap",
        "install",
        "--version",
        "v0.9.0",
        "--scope",
        "machine",
        "--dir",
        "/opt/tool",
        "--pattern",
        "*linux*.tar.gz",
        "--sha256",
        "abc",
        "--no-fallback",
        "--skip-path",
    ]) {
        CliCommand::Install {
            release,
            scope,
            dir,
            sha256,
            no_fallback,
            skip_path,
        } => {
            assert_eq!(release.version.as_deref(), Some("v0.9.0"));
            assert_eq!(release.pattern.as_deref(), Some("*linux*.tar.gz"));
            assert_eq!(scope, Some(Scope::Machine));
            assert_eq!(dir, Some(PathBuf::from("/opt/tool")));
            assert_eq!(sha256.as_deref(), Some("abc"));
            assert!(no_fallback);
            assert!(skip_path);
        }
        _ => panic!("expected Install"),
    }
}

#[test]
fn cli_parse_install_rejects_unknown_scope() {
    assert!(Cli::try_parse_from(["strap", "install", "--scope", "galaxy"]).is_err());
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["strap", "install", "--verbose", "--config", "/tmp/c.toml"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
}

#[test]
fn release_args_override_config() {
    let mut cfg = StrapConfig::default();
    ReleaseArgs {
        version: Some("v1.0.0".to_string()),
        pattern: None,
    }
    .apply(&mut cfg);
    assert_eq!(cfg.version, "v1.0.0");
    assert!(cfg.asset_pattern.is_none());
}
