//! SHA-256 of downloaded archives.
//!
//! Digests are computed on demand, reading in chunks so memory stays bounded.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Normalizes a user-supplied digest: optional `sha256:` prefix, surrounding
/// whitespace, any case. None unless the rest is exactly 64 hex digits.
pub fn normalize_sha256(expected: &str) -> Option<String> {
    let s = expected.trim();
    let s = s
        .strip_prefix("sha256:")
        .or_else(|| s.strip_prefix("SHA256:"))
        .unwrap_or(s);
    let decoded = hex::decode(s).ok()?;
    (decoded.len() == 32).then(|| s.to_ascii_lowercase())
}
