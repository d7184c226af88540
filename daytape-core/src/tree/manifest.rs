//! Manifest generation.
//!
//! Dates are found by scanning raw bytes for `"20YY-MM-DD"` followed by
//! optional whitespace, a colon, optional whitespace and `[`. Nothing is
//! parsed, so multi-gigabyte documents are scanned in bounded memory.

use super::{ticker_files, TickerFileKind, TreeError, DATES_SUFFIX, MANIFEST_FILE};
use crate::domain::{DatesDocument, Manifest};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bytes read per scan step.
pub const SCAN_CHUNK: usize = 1024 * 1024;

/// Bytes carried over between steps so keys split across reads are still seen.
pub const SCAN_OVERLAP: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSummary {
    pub manifest_path: PathBuf,
    pub tickers: Vec<String>,
    /// Dates found per scanned ticker.
    pub date_counts: BTreeMap<String, usize>,
    /// Tickers listed but not scanned (compressed documents).
    pub unscanned: Vec<String>,
}

/// Scan every ticker document in `dir` and write `manifest.json` plus one
/// `<ticker>.dates.json` per scanned ticker.
pub fn generate_manifest(dir: &Path) -> Result<ManifestSummary, TreeError> {
    let files = ticker_files(dir)?;

    let scanned: Vec<(String, Vec<String>)> = files
        .par_iter()
        .filter(|(_, _, kind)| *kind == TickerFileKind::Json)
        .map(|(ticker, path, _)| {
            let file = File::open(path).map_err(|e| TreeError::io(path, e))?;
            let dates = scan_dates(file, SCAN_CHUNK).map_err(|e| TreeError::io(path, e))?;
            info!(ticker = %ticker, dates = dates.len(), "scanned dates");
            Ok((ticker.clone(), dates.into_iter().collect()))
        })
        .collect::<Result<Vec<_>, TreeError>>()?;

    let mut manifest = Manifest {
        tickers: files.iter().map(|(t, _, _)| t.clone()).collect(),
        dates: BTreeMap::new(),
    };
    let mut date_counts = BTreeMap::new();
    for (ticker, dates) in scanned {
        let doc = DatesDocument { dates };
        let path = dir.join(format!("{ticker}{DATES_SUFFIX}"));
        write_json(&path, &doc)?;
        date_counts.insert(ticker.clone(), doc.dates.len());
        manifest.dates.insert(ticker, doc.dates);
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    write_json(&manifest_path, &manifest)?;
    info!(
        path = %manifest_path.display(),
        tickers = manifest.tickers.len(),
        "wrote manifest"
    );

    let unscanned = files
        .iter()
        .filter(|(_, _, kind)| *kind == TickerFileKind::Gzip)
        .map(|(t, _, _)| t.clone())
        .collect();
    Ok(ManifestSummary {
        manifest_path,
        tickers: manifest.tickers,
        date_counts,
        unscanned,
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), TreeError> {
    let bytes = serde_json::to_vec(value).map_err(|e| TreeError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, bytes).map_err(|e| TreeError::io(path, e))
}

/// Unique day keys in a ticker document, read `chunk_size` bytes at a time.
pub fn scan_dates<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<BTreeSet<String>> {
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut carry: Vec<u8> = Vec::new();
    let mut dates = BTreeSet::new();

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let mut data = std::mem::take(&mut carry);
        data.extend_from_slice(&chunk[..n]);
        collect_date_keys(&data, &mut dates);
        carry = data[data.len().saturating_sub(SCAN_OVERLAP)..].to_vec();
    }
    Ok(dates)
}

fn collect_date_keys(data: &[u8], out: &mut BTreeSet<String>) {
    for i in 0..data.len() {
        if data[i] == b'"' {
            if let Some(date) = date_key_at(data, i) {
                out.insert(date.to_string());
            }
        }
    }
}

/// The date of a `"20YY-MM-DD" : [` key starting at `data[i]`.
fn date_key_at(data: &[u8], i: usize) -> Option<&str> {
    let key = data.get(i..i + 12)?;
    let digit = |j: usize| key[j].is_ascii_digit();
    let shape = key[0] == b'"'
        && key[1] == b'2'
        && key[2] == b'0'
        && digit(3)
        && digit(4)
        && key[5] == b'-'
        && digit(6)
        && digit(7)
        && key[8] == b'-'
        && digit(9)
        && digit(10)
        && key[11] == b'"';
    if !shape {
        return None;
    }

    let skip_ws = |mut j: usize| {
        while data.get(j).is_some_and(|b| b.is_ascii_whitespace()) {
            j += 1;
        }
        j
    };
    let j = skip_ws(i + 12);
    if data.get(j) != Some(&b':') {
        return None;
    }
    let j = skip_ws(j + 1);
    if data.get(j) != Some(&b'[') {
        return None;
    }
    std::str::from_utf8(&key[1..11]).ok()
}
