//! Structured error types for day loading.
//!
//! Every loading strategy reports one of four kinds. The resolver treats all
//! of them as non-fatal and only surfaces [`LoadError::Exhausted`] once every
//! applicable strategy has failed.

use std::fmt;
use thiserror::Error;

/// Errors from sources, the streaming extractor and the resolver.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The strategy does not apply in this context (no network, no local file).
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// HTTP non-success, missing local file, or key absent from the stream.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON parse failure or unexpected document shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The stream ended after the array opened but before it closed.
    #[error("stream ended before the array for {date} closed ({bytes_scanned} bytes scanned)")]
    ExtractionIncomplete { date: String, bytes_scanned: u64 },

    /// Every applicable strategy failed.
    #[error("no source could load {ticker} {date}: {}", FailureList(.attempts))]
    Exhausted {
        ticker: String,
        date: String,
        attempts: Vec<StrategyFailure>,
    },
}

impl LoadError {
    /// Short name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::SourceUnavailable(_) => "SourceUnavailable",
            LoadError::NotFound(_) => "NotFound",
            LoadError::MalformedPayload(_) => "MalformedPayload",
            LoadError::ExtractionIncomplete { .. } => "ExtractionIncomplete",
            LoadError::Exhausted { .. } => "Exhausted",
        }
    }
}

/// One failed strategy attempt, kept for diagnostics.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: LoadError,
}

struct FailureList<'a>(&'a [StrategyFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no strategies attempted");
        }
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} -> {}", failure.strategy, failure.error)?;
        }
        Ok(())
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(err.to_string()),
            _ => LoadError::SourceUnavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::MalformedPayload(err.to_string())
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        LoadError::SourceUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: LoadError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn io_other_maps_to_unavailable() {
        let err: LoadError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, LoadError::SourceUnavailable(_)));
    }

    #[test]
    fn exhausted_lists_every_attempt() {
        let err = LoadError::Exhausted {
            ticker: "AAA".into(),
            date: "2024-01-03".into(),
            attempts: vec![
                StrategyFailure {
                    strategy: "local_day_file",
                    error: LoadError::SourceUnavailable("no local file".into()),
                },
                StrategyFailure {
                    strategy: "full_dataset",
                    error: LoadError::NotFound("date 2024-01-03".into()),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("AAA 2024-01-03"));
        assert!(msg.contains("local_day_file -> source unavailable"));
        assert!(msg.contains("full_dataset -> not found"));
        assert_eq!(err.kind(), "Exhausted");
    }
}
