//! Split monolithic ticker documents into per-day files.
//!
//! `<dir>/<T>.json` becomes `<dir>/<T>/<YYYY-MM-DD>.json`, each holding the
//! day's records in the flat shape as compact JSON.

use super::{ticker_files, TickerFileKind, TreeError};
use crate::data::normalize_day;
use crate::domain::{is_date_key, TickerDataset};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitSummary {
    /// Day files written per ticker.
    pub written: BTreeMap<String, usize>,
    /// Requested tickers with no `<T>.json` in the directory.
    pub missing: Vec<String>,
}

impl SplitSummary {
    pub fn total_files(&self) -> usize {
        self.written.values().sum()
    }
}

/// Split `tickers` (every uncompressed ticker document when empty).
pub fn split_by_day(dir: &Path, tickers: &[String]) -> Result<SplitSummary, TreeError> {
    let tickers: Vec<String> = if tickers.is_empty() {
        ticker_files(dir)?
            .into_iter()
            .filter(|(_, _, kind)| *kind == TickerFileKind::Json)
            .map(|(t, _, _)| t)
            .collect()
    } else {
        if !dir.is_dir() {
            return Err(TreeError::MissingDirectory(dir.to_path_buf()));
        }
        tickers.to_vec()
    };

    let mut summary = SplitSummary::default();
    for ticker in tickers {
        let in_path = dir.join(format!("{ticker}.json"));
        if !in_path.is_file() {
            warn!(ticker = %ticker, path = %in_path.display(), "skipping: file not found");
            summary.missing.push(ticker);
            continue;
        }
        let count = split_one(dir, &ticker, &in_path)?;
        info!(ticker = %ticker, days = count, "wrote day files");
        summary.written.insert(ticker, count);
    }
    Ok(summary)
}

fn split_one(dir: &Path, ticker: &str, in_path: &Path) -> Result<usize, TreeError> {
    let bytes = std::fs::read(in_path).map_err(|e| TreeError::io(in_path, e))?;
    let dataset = TickerDataset::from_slice(ticker, &bytes).map_err(|e| TreeError::Malformed {
        path: in_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let out_dir = dir.join(ticker);
    std::fs::create_dir_all(&out_dir).map_err(|e| TreeError::io(&out_dir, e))?;

    let mut count = 0;
    for (date, day) in &dataset.days {
        if !is_date_key(date) {
            warn!(ticker, key = %date, "skipping non-date key");
            continue;
        }
        let records = normalize_day(day);
        let out_path = out_dir.join(format!("{date}.json"));
        let json = serde_json::to_vec(&records).map_err(|e| TreeError::Malformed {
            path: out_path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&out_path, json).map_err(|e| TreeError::io(&out_path, e))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize_day_bytes;

    const DOC: &str = r#"{"ticker":"AAA","days":{
        "2024-01-02":[{"time":"09:30:00","open":1,"high":2,"low":0.5,"close":1.5,"volume":100,"count":3}],
        "2024-01-03":{"day":[{"t":"09:30:00","o":2,"h":2,"l":2,"c":2,"v":"","cnt":null}]},
        "meta":[]
    }}"#;

    #[test]
    fn writes_flat_compact_day_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAA.json"), DOC).unwrap();

        let summary = split_by_day(dir.path(), &[]).unwrap();
        assert_eq!(summary.written.get("AAA"), Some(&2));
        assert_eq!(summary.total_files(), 2);

        let text = std::fs::read_to_string(dir.path().join("AAA/2024-01-02.json")).unwrap();
        assert_eq!(
            text,
            r#"[{"t":"09:30:00","o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":100.0,"cnt":3.0}]"#
        );
        let day = normalize_day_bytes(text.as_bytes()).unwrap();
        assert_eq!(day[0].c, 1.5);

        let unwrapped = std::fs::read(dir.path().join("AAA/2024-01-03.json")).unwrap();
        let day = normalize_day_bytes(&unwrapped).unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].v, 0.0);
        assert!(!dir.path().join("AAA/meta.json").exists());
    }

    #[test]
    fn missing_tickers_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAA.json"), DOC).unwrap();
        let summary = split_by_day(dir.path(), &["ZZZ".to_string(), "AAA".to_string()]).unwrap();
        assert_eq!(summary.missing, vec!["ZZZ"]);
        assert_eq!(summary.written.len(), 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BAD.json"), "{\"ticker\":\"BAD\"}").unwrap();
        let err = split_by_day(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, TreeError::Malformed { .. }));
    }
}
