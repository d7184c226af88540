//! Offline tooling for a data tree directory, plus ticker discovery.
//!
//! - `manifest`: scan ticker documents for dates, write `manifest.json` and `<T>.dates.json`
//! - `split`: fan a monolithic document out into `<T>/<date>.json` files
//! - `discover`: list the tickers a local index or remote tree offers

pub mod discover;
pub mod manifest;
pub mod split;

pub use discover::{discover_tickers, parse_listing, FALLBACK_TICKERS};
pub use manifest::{generate_manifest, scan_dates, ManifestSummary};
pub use split::{split_by_day, SplitSummary};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("data directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed document {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

impl TreeError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const MANIFEST_FILE: &str = "manifest.json";
const DATES_SUFFIX: &str = ".dates.json";
const GZIP_SUFFIX: &str = ".json.gz";

/// How a file in the tree root is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickerFileKind {
    Json,
    /// Listed but not scanned.
    Gzip,
}

/// Ticker documents directly under `dir`, sorted by ticker.
pub(crate) fn ticker_files(dir: &Path) -> Result<Vec<(String, PathBuf, TickerFileKind)>, TreeError> {
    if !dir.is_dir() {
        return Err(TreeError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|e| TreeError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TreeError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((ticker, kind)) = classify(name) {
            files.push((ticker, path, kind));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Ticker name and storage kind for a file name, if it is a ticker document.
pub(crate) fn classify(name: &str) -> Option<(String, TickerFileKind)> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(GZIP_SUFFIX) {
        let ticker = &name[..name.len() - GZIP_SUFFIX.len()];
        return (!ticker.is_empty()).then(|| (ticker.to_string(), TickerFileKind::Gzip));
    }
    if lower.ends_with(".json") && !lower.ends_with(DATES_SUFFIX) && lower != MANIFEST_FILE {
        let ticker = &name[..name.len() - ".json".len()];
        return (!ticker.is_empty()).then(|| (ticker.to_string(), TickerFileKind::Json));
    }
    None
}
