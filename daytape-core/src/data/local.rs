//! Index of a user-selected local data directory.
//!
//! Layout: `{root}/{TICKER}.json` (monolithic) and `{root}/{TICKER}/{YYYY-MM-DD}.json`
//! (per-day). The index is rebuilt from scratch on every directory selection.

use super::error::LoadError;
use crate::domain::{is_date_key, DayKey};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File names in a data directory that are not ticker documents.
const MANIFEST_FILE: &str = "manifest.json";
const DATES_SUFFIX: &str = ".dates.json";

/// Lookup tables from ticker and `ticker:date` to local files.
#[derive(Debug, Clone, Default)]
pub struct LocalFileIndex {
    root: Option<PathBuf>,
    monolithic: BTreeMap<String, PathBuf>,
    per_day: BTreeMap<String, PathBuf>,
}

impl LocalFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` recursively and classify every `.json` file.
    pub fn scan(root: &Path) -> Result<Self, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::NotFound(format!(
                "local data directory {} does not exist",
                root.display()
            )));
        }
        let mut index = Self {
            root: Some(root.to_path_buf()),
            ..Self::default()
        };
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    index.insert(path);
                }
            }
        }
        debug!(
            root = %root.display(),
            tickers = index.monolithic.len(),
            day_files = index.per_day.len(),
            "indexed local directory"
        );
        Ok(index)
    }

    /// Classify one file path and record it.
    ///
    /// A file whose stem is a date and which sits inside a directory is a
    /// per-day file for that directory's ticker. Any other `.json` file other
    /// than the manifest and `*.dates.json` is a monolithic ticker document.
    pub fn insert(&mut self, path: PathBuf) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let lower = name.to_ascii_lowercase();
        if !lower.ends_with(".json") {
            return;
        }
        let stem = &name[..name.len() - ".json".len()];

        if is_date_key(stem) {
            let ticker = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str());
            if let Some(ticker) = ticker {
                let key = DayKey::new(ticker, stem).to_string();
                self.per_day.insert(key, path);
            }
            return;
        }

        if lower == MANIFEST_FILE || lower.ends_with(DATES_SUFFIX) || stem.is_empty() {
            return;
        }
        self.monolithic.insert(stem.to_string(), path);
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Per-day file for (ticker, date).
    pub fn day_file(&self, ticker: &str, date: &str) -> Option<&Path> {
        self.per_day
            .get(&DayKey::new(ticker, date).to_string())
            .map(PathBuf::as_path)
    }

    /// Monolithic document for a ticker.
    pub fn ticker_file(&self, ticker: &str) -> Option<&Path> {
        self.monolithic.get(ticker).map(PathBuf::as_path)
    }

    /// Tickers with a monolithic document, sorted.
    pub fn tickers(&self) -> Vec<String> {
        self.monolithic.keys().cloned().collect()
    }

    /// Tickers with either a monolithic document or per-day files, sorted.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut tickers: BTreeSet<String> = self.monolithic.keys().cloned().collect();
        tickers.extend(
            self.per_day
                .keys()
                .filter_map(|k| k.split_once(':'))
                .map(|(ticker, _)| ticker.to_string()),
        );
        tickers.into_iter().collect()
    }

    /// Dates with a per-day file for `ticker`, sorted.
    pub fn day_dates(&self, ticker: &str) -> Vec<String> {
        let prefix = format!("{ticker}:");
        self.per_day
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.monolithic.is_empty() && self.per_day.is_empty()
    }

    pub fn day_file_count(&self) -> usize {
        self.per_day.len()
    }
}
