//! Integration test: releases API client and HTTP download against a local server.

mod common;

use common::http_server::{self, Route};
use std::fs;
use std::time::Duration;
use strap_core::release::{
    resolve_asset, AssetQuery, GitHubReleases, ReleaseSource, ResolutionError, VersionSelector,
};
use strap_core::transport::{temp_path, FetchStrategy, HttpFetch, Transport, TransportError};
use tempfile::tempdir;

const RELEASES: &str = "/repos/acme/tool/releases";

fn client(base: &str) -> GitHubReleases {
    GitHubReleases::new(base, Duration::from_secs(5), Duration::from_secs(10))
}

fn http() -> HttpFetch {
    HttpFetch::new(
        Duration::from_secs(5),
        Duration::from_secs(10),
        Duration::from_secs(10),
    )
}

#[test]
fn lists_releases_newest_first() {
    let server = http_server::start();
    server.route(
        RELEASES,
        Route::json(
            r#"[{"tag_name":"v0.9.0","id":7,"assets":[{"name":"tool-windows-gnu-v0.9.0.zip","browser_download_url":"U"}]},
                {"tag_name":"v0.8.0","assets":[]}]"#,
        ),
    );
    let releases = client(server.base()).list_releases("acme", "tool").unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].tag, "v0.9.0");
    assert_eq!(releases[0].assets[0].url, "U");
    assert_eq!(server.hits(RELEASES), 1);
}

#[test]
fn latest_resolution_over_http() {
    let server = http_server::start();
    server.route(
        RELEASES,
        Route::json(
            r#"[{"tag_name":"v0.9.0","assets":[
                {"name":"tool-linux-gnu-v0.9.0.tar.gz","browser_download_url":"https://h/l"},
                {"name":"tool-windows-gnu-v0.9.0.zip","browser_download_url":"https://h/w"}]}]"#,
        ),
    );
    let query = AssetQuery {
        org: "acme".to_string(),
        repo: "tool".to_string(),
        binary: "tool".to_string(),
        pattern: "*windows-gnu*.zip".to_string(),
        version: VersionSelector::Latest,
        pinned_template: "{binary}.zip".to_string(),
        download_base: server.base().to_string(),
    };
    let d = resolve_asset(&client(server.base()), &query).unwrap();
    assert_eq!(d.url, "https://h/w");
    assert_eq!(d.file_name, "tool-windows-gnu-v0.9.0.zip");
    assert_eq!(d.tag, "v0.9.0");
}

#[test]
fn empty_release_list_is_an_error() {
    let server = http_server::start();
    server.route(RELEASES, Route::json("[]"));
    let query = AssetQuery {
        org: "acme".to_string(),
        repo: "tool".to_string(),
        binary: "tool".to_string(),
        pattern: "*".to_string(),
        version: VersionSelector::Latest,
        pinned_template: "{binary}.zip".to_string(),
        download_base: server.base().to_string(),
    };
    let err = resolve_asset(&client(server.base()), &query).unwrap_err();
    assert!(matches!(err, ResolutionError::NoReleases { .. }));
}

#[test]
fn api_error_status_and_bad_json() {
    let server = http_server::start();
    server.route(RELEASES, Route::status(500));
    let err = client(server.base()).list_releases("acme", "tool").unwrap_err();
    assert!(matches!(err, ResolutionError::Http { status: 500, .. }));

    server.route(RELEASES, Route::json(r#"{"message":"API rate limit exceeded"}"#));
    let err = client(server.base()).list_releases("acme", "tool").unwrap_err();
    assert!(matches!(err, ResolutionError::Malformed { .. }));
}

#[test]
fn http_fetch_writes_body_and_cleans_temp() {
    let body: Vec<u8> = (0u8..=255).cycle().take(200 * 1024).collect();
    let server = http_server::start();
    server.route("/a.zip", Route::ok(body.clone()));
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.zip");

    http().fetch(&server.url("/a.zip"), &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), body);
    assert!(!temp_path(&dest).exists());
}

#[test]
fn http_fetch_404_leaves_no_file() {
    let server = http_server::start();
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.zip");

    let err = http().fetch(&server.url("/missing.zip"), &dest).unwrap_err();
    assert!(matches!(err, TransportError::Http { status: 404, .. }));
    assert!(!dest.exists());
    assert!(!temp_path(&dest).exists());
}

#[test]
fn empty_body_fails_post_check() {
    let server = http_server::start();
    server.route("/empty.zip", Route::ok(Vec::new()));
    let dir = tempdir().unwrap();
    let dest = dir.path().join("empty.zip");

    let transport = Transport::new(vec![Box::new(http())]);
    let err = transport.fetch(&server.url("/empty.zip"), &dest).unwrap_err();
    match err {
        TransportError::Exhausted { failures, .. } => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                failures[0].error,
                TransportError::MissingOrEmpty { .. }
            ));
        }
        other => panic!("unexpected: {other}"),
    }
}
