//! Document types: the monolithic ticker dataset, the manifest and the
//! per-ticker dates document.

use crate::data::error::LoadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A fully parsed per-ticker document.
///
/// Day arrays are kept as raw JSON so they can be normalized lazily, one day
/// at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDataset {
    #[serde(default)]
    pub ticker: String,
    pub days: BTreeMap<String, Value>,
}

impl TickerDataset {
    /// Parse a monolithic document. A document without a `days` object is
    /// malformed.
    pub fn from_slice(ticker: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(ticker, value)
    }

    pub fn from_value(ticker: &str, value: Value) -> Result<Self, LoadError> {
        match value.get("days") {
            Some(Value::Object(_)) => {}
            _ => {
                return Err(LoadError::MalformedPayload(format!(
                    "{ticker}: document has no \"days\" object"
                )))
            }
        }
        let mut dataset: TickerDataset = serde_json::from_value(value)?;
        if dataset.ticker.is_empty() {
            dataset.ticker = ticker.to_string();
        }
        Ok(dataset)
    }

    /// Raw day array for `date`, if present.
    pub fn day(&self, date: &str) -> Option<&Value> {
        self.days.get(date)
    }

    /// All dates in the document, ascending.
    pub fn dates(&self) -> Vec<String> {
        self.days.keys().cloned().collect()
    }
}

/// Precomputed index of tickers and their dates (`manifest.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub dates: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// The empty manifest, cached after a failed or skipped fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty() && self.dates.is_empty()
    }

    /// Sorted dates for `ticker`, or `None` if the manifest has none.
    pub fn dates_for(&self, ticker: &str) -> Option<Vec<String>> {
        let dates = self.dates.get(ticker)?;
        if dates.is_empty() {
            return None;
        }
        let mut sorted = dates.clone();
        sorted.sort();
        Some(sorted)
    }
}

/// Per-ticker dates document (`<ticker>.dates.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatesDocument {
    pub dates: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_without_days_is_malformed() {
        let err = TickerDataset::from_slice("X", br#"{"ticker":"X"}"#).unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload(_)));
    }

    #[test]
    fn dataset_fills_missing_ticker() {
        let ds = TickerDataset::from_slice("X", br#"{"days":{"2024-01-03":[],"2024-01-02":[]}}"#)
            .unwrap();
        assert_eq!(ds.ticker, "X");
        assert_eq!(ds.dates(), vec!["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn manifest_dates_are_sorted_and_empty_is_none() {
        let m: Manifest = serde_json::from_str(
            r#"{"tickers":["A","B"],"dates":{"A":["2024-01-03","2024-01-02"],"B":[]}}"#,
        )
        .unwrap();
        assert_eq!(
            m.dates_for("A"),
            Some(vec!["2024-01-02".to_string(), "2024-01-03".to_string()])
        );
        assert_eq!(m.dates_for("B"), None);
        assert_eq!(m.dates_for("C"), None);
    }

    #[test]
    fn partial_manifest_parses() {
        let m: Manifest = serde_json::from_str(r#"{"tickers":["A"]}"#).unwrap();
        assert!(m.dates.is_empty());
        assert!(!m.is_empty());
        assert!(Manifest::empty().is_empty());
    }
}
