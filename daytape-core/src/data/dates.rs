//! Available-date lookup for a ticker.
//!
//! Cheap sources are tried first so the full dataset does not have to be
//! loaded just to populate a date list:
//! 1. The session's manifest (fetched at most once per session)
//! 2. The per-ticker dates document
//! 3. Otherwise `Unknown`, and the caller derives dates from the dataset

use super::remote::{dates_path, manifest_path, RemoteSource};
use super::session::SessionStore;
use crate::domain::{DatesDocument, Manifest};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Outcome of a date lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatesLookup {
    /// Sorted dates from a cheap source.
    Known(Vec<String>),
    /// No cheap source knows this ticker.
    Unknown,
}

/// Resolves ticker dates from the manifest or the dates document.
pub struct TickerDateIndex {
    remote: Option<Rc<dyn RemoteSource>>,
}

impl TickerDateIndex {
    pub fn new(remote: Option<Rc<dyn RemoteSource>>) -> Self {
        Self { remote }
    }

    /// The session's manifest, fetching it on first use.
    ///
    /// Without a network context, or when the fetch or parse fails, the empty
    /// manifest is cached so the fetch is never repeated.
    pub fn manifest(&self, session: &mut SessionStore) -> Rc<Manifest> {
        if let Some(manifest) = session.cached_manifest() {
            return manifest;
        }
        let manifest = match self.remote.as_deref() {
            None => {
                debug!("no network context, caching empty manifest");
                Manifest::empty()
            }
            Some(remote) => match remote
                .fetch(&manifest_path())
                .and_then(|bytes| Ok(serde_json::from_slice::<Manifest>(&bytes)?))
            {
                Ok(manifest) => {
                    info!(tickers = manifest.tickers.len(), "manifest loaded");
                    manifest
                }
                Err(e) => {
                    warn!(error = %e, "manifest unavailable, caching empty manifest");
                    Manifest::empty()
                }
            },
        };
        session.store_manifest(manifest)
    }

    /// Sorted dates for `ticker`, or `Unknown`.
    pub fn lookup(&self, session: &mut SessionStore, ticker: &str) -> DatesLookup {
        if let Some(dates) = self.manifest(session).dates_for(ticker) {
            debug!(ticker, dates = dates.len(), "dates from manifest");
            return DatesLookup::Known(dates);
        }

        let Some(remote) = self.remote.as_deref() else {
            return DatesLookup::Unknown;
        };
        let doc = remote
            .fetch(&dates_path(ticker))
            .and_then(|bytes| Ok(serde_json::from_slice::<DatesDocument>(&bytes)?));
        match doc {
            Ok(mut doc) => {
                doc.dates.sort();
                debug!(ticker, dates = doc.dates.len(), "dates from dates document");
                DatesLookup::Known(doc.dates)
            }
            Err(e) => {
                debug!(ticker, error = %e, "no dates document");
                DatesLookup::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::remote::MemoryRemote;

    #[test]
    fn manifest_is_fetched_once_across_tickers() {
        let remote = Rc::new(MemoryRemote::new().with(
            "manifest.json",
            r#"{"tickers":["A","B"],"dates":{"A":["2024-01-03","2024-01-02"],"B":["2024-02-01"]}}"#,
        ));
        let index = TickerDateIndex::new(Some(remote.clone()));
        let mut session = SessionStore::new();

        assert_eq!(
            index.lookup(&mut session, "A"),
            DatesLookup::Known(vec!["2024-01-02".into(), "2024-01-03".into()])
        );
        assert_eq!(
            index.lookup(&mut session, "B"),
            DatesLookup::Known(vec!["2024-02-01".into()])
        );
        assert_eq!(remote.request_count("manifest.json"), 1);
    }

    #[test]
    fn failed_manifest_is_cached_as_empty() {
        let remote = Rc::new(
            MemoryRemote::new().with("C.dates.json", r#"{"dates":["2024-03-02","2024-03-01"]}"#),
        );
        let index = TickerDateIndex::new(Some(remote.clone()));
        let mut session = SessionStore::new();

        assert_eq!(
            index.lookup(&mut session, "C"),
            DatesLookup::Known(vec!["2024-03-01".into(), "2024-03-02".into()])
        );
        assert_eq!(index.lookup(&mut session, "D"), DatesLookup::Unknown);
        assert_eq!(remote.request_count("manifest.json"), 1);
        assert_eq!(*index.manifest(&mut session), Manifest::empty());
    }

    #[test]
    fn malformed_manifest_is_treated_as_empty() {
        let remote = Rc::new(MemoryRemote::new().with("manifest.json", "{not json"));
        let index = TickerDateIndex::new(Some(remote));
        let mut session = SessionStore::new();
        assert!(index.manifest(&mut session).is_empty());
    }

    #[test]
    fn offline_is_unknown() {
        let index = TickerDateIndex::new(None);
        let mut session = SessionStore::new();
        assert_eq!(index.lookup(&mut session, "A"), DatesLookup::Unknown);
        assert!(session.cached_manifest().is_some());
    }
}
