// src/sync/fetch.rs

//! Fetching index and archive blobs
//!
//! `file://` URLs are read straight from disk so a local mirror (or a test
//! fixture) can be synced without a web server.

use crate::error::{Error, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(Vec<u8>),
    NotFound,
    Failed(String),
}

impl FetchOutcome {
    /// Turn anything but `Found` into a download error
    pub fn into_bytes(self, url: &str) -> Result<Vec<u8>> {
        match self {
            FetchOutcome::Found(bytes) => Ok(bytes),
            FetchOutcome::NotFound => Err(Error::DownloadError(format!("{url}: not found"))),
            FetchOutcome::Failed(reason) => Err(Error::DownloadError(format!("{url}: {reason}"))),
        }
    }
}

/// Source of raw blobs
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Fetcher for `file://` and HTTP(S) repositories
pub struct RepositoryFetcher {
    client: Client,
}

impl RepositoryFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn fetch_file(&self, url: &Url) -> FetchOutcome {
        let path = match url.to_file_path() {
            Ok(path) => path,
            Err(()) => return FetchOutcome::Failed(format!("Invalid file URL: {url}")),
        };

        match std::fs::read(&path) {
            Ok(bytes) => FetchOutcome::Found(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FetchOutcome::NotFound,
            Err(e) => FetchOutcome::Failed(format!("Failed to read {}: {e}", path.display())),
        }
    }

    fn fetch_http(&self, url: &Url) -> FetchOutcome {
        let response = match self.client.get(url.as_str()).send() {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(format!("Failed to fetch {url}: {e}")),
        };

        match response.status() {
            StatusCode::NOT_FOUND => FetchOutcome::NotFound,
            status if !status.is_success() => FetchOutcome::Failed(format!("HTTP {status}")),
            _ => match response.bytes() {
                Ok(bytes) => FetchOutcome::Found(bytes.to_vec()),
                Err(e) => FetchOutcome::Failed(format!("Failed to read response: {e}")),
            },
        }
    }
}

impl Fetcher for RepositoryFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        debug!("Fetching {}", url);

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return FetchOutcome::Failed(format!("Invalid URL {url}: {e}")),
        };

        match parsed.scheme() {
            "file" => self.fetch_file(&parsed),
            "http" | "https" => self.fetch_http(&parsed),
            scheme => FetchOutcome::Failed(format!("Unsupported URL scheme: {scheme}")),
        }
    }
}
