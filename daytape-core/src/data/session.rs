//! Session-scoped caches.
//!
//! The session owns three pieces of mutable state:
//! - the local file index (replaced wholesale on each directory selection)
//! - fully parsed ticker datasets (loaded at most once per ticker)
//! - the manifest (fetched at most once; failures cached as empty)
//!
//! Everything starts empty. Selecting a local directory resets all of it.

use super::error::{LoadError, Result};
use super::local::LocalFileIndex;
use super::remote::{ticker_path, RemoteSource};
use crate::domain::{Manifest, TickerDataset};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct SessionStore {
    local: LocalFileIndex,
    datasets: HashMap<String, Rc<TickerDataset>>,
    manifest: Option<Rc<Manifest>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` and make it the session's local directory.
    ///
    /// On failure the previous state is left untouched.
    pub fn select_directory(&mut self, root: &Path) -> Result<&LocalFileIndex> {
        let index = LocalFileIndex::scan(root)?;
        info!(
            root = %root.display(),
            tickers = index.tickers().len(),
            day_files = index.day_file_count(),
            "selected local directory"
        );
        self.replace_local_index(index);
        Ok(&self.local)
    }

    /// Install a new local index and drop every cache that depends on it.
    pub fn replace_local_index(&mut self, index: LocalFileIndex) {
        self.local = index;
        self.datasets.clear();
        self.manifest = None;
    }

    pub fn local(&self) -> &LocalFileIndex {
        &self.local
    }

    /// True when a local directory has been selected.
    pub fn has_local_directory(&self) -> bool {
        self.local.root().is_some()
    }

    pub fn cached_dataset(&self, ticker: &str) -> Option<Rc<TickerDataset>> {
        self.datasets.get(ticker).cloned()
    }

    pub fn cached_tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.datasets.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    /// Load the full dataset for `ticker`, from the cache, the local
    /// monolithic file, or the remote monolithic document, in that order.
    pub fn dataset(
        &mut self,
        ticker: &str,
        remote: Option<&dyn RemoteSource>,
    ) -> Result<Rc<TickerDataset>> {
        if let Some(dataset) = self.datasets.get(ticker) {
            debug!(ticker, "dataset cache hit");
            return Ok(Rc::clone(dataset));
        }

        let bytes = if let Some(path) = self.local.ticker_file(ticker) {
            debug!(ticker, path = %path.display(), "reading local dataset");
            std::fs::read(path)?
        } else if let Some(remote) = remote {
            debug!(ticker, source = remote.name(), "fetching remote dataset");
            remote.fetch(&ticker_path(ticker))?
        } else {
            return Err(LoadError::SourceUnavailable(format!(
                "no local file and no network for {ticker} dataset"
            )));
        };

        let dataset = Rc::new(TickerDataset::from_slice(ticker, &bytes)?);
        info!(ticker, days = dataset.days.len(), bytes = bytes.len(), "dataset loaded");
        self.datasets.insert(ticker.to_string(), Rc::clone(&dataset));
        Ok(dataset)
    }

    pub fn cached_manifest(&self) -> Option<Rc<Manifest>> {
        self.manifest.clone()
    }

    pub fn store_manifest(&mut self, manifest: Manifest) -> Rc<Manifest> {
        let manifest = Rc::new(manifest);
        self.manifest = Some(Rc::clone(&manifest));
        manifest
    }
}
