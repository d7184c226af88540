//! Remote data tree access.
//!
//! The [`RemoteSource`] trait abstracts over where the data tree is served
//! from so the resolver can be exercised against an in-memory tree in tests.
//! Paths are relative to the tree root: `manifest.json`, `{TICKER}.json`,
//! `{TICKER}.dates.json`, `{TICKER}/{DATE}.json`.

use super::error::{LoadError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::debug;

/// A data tree reachable over the network.
pub trait RemoteSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Open a document for streaming reads.
    ///
    /// A non-success response is `NotFound`; a transport failure is
    /// `SourceUnavailable`.
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>>;

    /// Fetch a whole document.
    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Path of the manifest document.
pub fn manifest_path() -> String {
    "manifest.json".to_string()
}

/// Path of a ticker's monolithic document.
pub fn ticker_path(ticker: &str) -> String {
    format!("{ticker}.json")
}

/// Path of a ticker's dates document.
pub fn dates_path(ticker: &str) -> String {
    format!("{ticker}.dates.json")
}

/// Path of one per-day document.
pub fn day_path(ticker: &str, date: &str) -> String {
    format!("{ticker}/{date}.json")
}

/// HTTP data tree served under a base URL (e.g. `http://host/data_json`).
pub struct HttpRemote {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a tree-relative path. An empty path is the tree root
    /// (directory listing).
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

impl RemoteSource for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>> {
        let url = self.url(path);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()?;
        let status = resp.status();
        debug!(%url, %status, "remote request");
        if !status.is_success() {
            return Err(LoadError::NotFound(format!("HTTP {status} for {url}")));
        }
        Ok(Box::new(resp))
    }
}

/// In-memory data tree. Records every requested path.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    documents: BTreeMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: &str, body: impl Into<Vec<u8>>) {
        self.documents.insert(path.to_string(), body.into());
    }

    /// Paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of times `path` was requested.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|p| *p == path).count()
    }
}

impl RemoteSource for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>> {
        self.requests.borrow_mut().push(path.to_string());
        match self.documents.get(path) {
            Some(body) => Ok(Box::new(Cursor::new(body.as_slice()))),
            None => Err(LoadError::NotFound(format!("HTTP 404 Not Found for {path}"))),
        }
    }
}
