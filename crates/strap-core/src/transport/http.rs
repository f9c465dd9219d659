//! Built-in HTTP download through libcurl.
//!
//! The body streams into `<dest>.part`, which is renamed over `dest` only after
//! a 2xx response. Any failure removes the partial file.

use super::{classify_curl_error, FetchStrategy, TransportError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("strap/", env!("CARGO_PKG_VERSION"));
/// Bytes/sec below which a transfer counts as stalled.
const LOW_SPEED_LIMIT: u32 = 1024;

/// Temp path used while a download is in progress: `<dest>.part`.
pub fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Primary strategy: single GET, redirects followed.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    connect_timeout: Duration,
    transfer_timeout: Duration,
    low_speed_time: Duration,
}

impl HttpFetch {
    pub fn new(connect_timeout: Duration, transfer_timeout: Duration, low_speed_time: Duration) -> Self {
        Self {
            connect_timeout,
            transfer_timeout,
            low_speed_time,
        }
    }

    fn perform(&self, url: &str, part: &Path) -> Result<u64, TransportError> {
        let curl_err = |e: curl::Error| classify_curl_error(&e, self.transfer_timeout);
        let io_err = |e: std::io::Error| TransportError::Io {
            path: part.display().to_string(),
            reason: e.to_string(),
        };

        let mut file = File::create(part).map_err(io_err)?;
        let mut written: u64 = 0;
        let mut write_error: Option<std::io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(curl_err)?;
        easy.follow_location(true).map_err(curl_err)?;
        easy.max_redirections(10).map_err(curl_err)?;
        easy.useragent(USER_AGENT).map_err(curl_err)?;
        easy.connect_timeout(self.connect_timeout).map_err(curl_err)?;
        easy.low_speed_limit(LOW_SPEED_LIMIT).map_err(curl_err)?;
        easy.low_speed_time(self.low_speed_time).map_err(curl_err)?;
        easy.timeout(self.transfer_timeout).map_err(curl_err)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(curl_err)?;
            transfer.perform()
        };

        if let Some(e) = write_error {
            return Err(io_err(e));
        }
        performed.map_err(curl_err)?;

        let code = easy.response_code().map_err(curl_err)?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http {
                url: url.to_string(),
                status: code,
            });
        }
        file.sync_all().map_err(io_err)?;
        Ok(written)
    }
}

impl FetchStrategy for HttpFetch {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let part = temp_path(dest);
        match self.perform(url, &part) {
            Ok(bytes) => {
                fs::rename(&part, dest).map_err(|e| {
                    let _ = fs::remove_file(&part);
                    TransportError::Io {
                        path: dest.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                tracing::debug!(bytes, dest = %dest.display(), "http transfer finished");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&part);
                Err(e)
            }
        }
    }
}
