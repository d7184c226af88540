//! Day resolution across local and remote sources.
//!
//! For one (ticker, date) request the resolver runs an ordered list of
//! strategies and returns the first success:
//! 1. Local per-day file
//! 2. Remote per-day document (network only)
//! 3. Streaming extraction from the local monolithic file, else the remote one
//! 4. Full dataset load (cached for the session), then slice out the day
//!
//! A strategy failure of any kind is recorded and the next strategy runs.
//! Only when every strategy has failed does the caller see an error, and
//! that error carries every recorded failure.

use super::error::{LoadError, Result, StrategyFailure};
use super::extract::{extract_day, ExtractOptions};
use super::normalize::{normalize_day, normalize_day_bytes};
use super::remote::{day_path, ticker_path, RemoteSource};
use super::session::SessionStore;
use crate::domain::{DayKey, DayRecord};
use std::fs::File;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Everything a strategy may touch while loading one day.
pub struct LoadContext<'a> {
    pub session: &'a mut SessionStore,
    pub remote: Option<&'a dyn RemoteSource>,
    pub extract: &'a ExtractOptions,
}

/// One way of loading a day.
pub trait DayStrategy {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    fn load(&self, ctx: &mut LoadContext<'_>, key: &DayKey) -> Result<Vec<DayRecord>>;
}

/// Strategy 1: `{root}/{TICKER}/{DATE}.json` from the local index.
pub struct LocalDayFile;

impl DayStrategy for LocalDayFile {
    fn name(&self) -> &'static str {
        "local_day_file"
    }

    fn load(&self, ctx: &mut LoadContext<'_>, key: &DayKey) -> Result<Vec<DayRecord>> {
        let path = ctx
            .session
            .local()
            .day_file(&key.ticker, &key.date)
            .ok_or_else(|| LoadError::SourceUnavailable(format!("no local day file for {key}")))?;
        let bytes = std::fs::read(path)?;
        Ok(normalize_day_bytes(&bytes)?)
    }
}

/// Strategy 2: `{base}/{TICKER}/{DATE}.json` from the remote tree.
pub struct RemoteDayFile;

impl DayStrategy for RemoteDayFile {
    fn name(&self) -> &'static str {
        "remote_day_file"
    }

    fn load(&self, ctx: &mut LoadContext<'_>, key: &DayKey) -> Result<Vec<DayRecord>> {
        let remote = ctx
            .remote
            .ok_or_else(|| LoadError::SourceUnavailable("no network context".into()))?;
        let bytes = remote.fetch(&day_path(&key.ticker, &key.date))?;
        Ok(normalize_day_bytes(&bytes)?)
    }
}

/// Strategy 3: stream the monolithic document and cut out the day's array.
pub struct StreamExtract;

impl DayStrategy for StreamExtract {
    fn name(&self) -> &'static str {
        "stream_extract"
    }

    fn load(&self, ctx: &mut LoadContext<'_>, key: &DayKey) -> Result<Vec<DayRecord>> {
        let raw = if let Some(path) = ctx.session.local().ticker_file(&key.ticker) {
            debug!(%key, path = %path.display(), "streaming local dataset");
            extract_day(File::open(path)?, &key.date, ctx.extract)?
        } else if let Some(remote) = ctx.remote {
            debug!(%key, source = remote.name(), "streaming remote dataset");
            let reader = remote.open(&ticker_path(&key.ticker))?;
            extract_day(reader, &key.date, ctx.extract)?
        } else {
            return Err(LoadError::SourceUnavailable(format!(
                "no local dataset and no network for {}",
                key.ticker
            )));
        };
        Ok(normalize_day(&raw))
    }
}

/// Strategy 4: parse the whole monolithic document (cached) and index the day.
pub struct FullDataset;

impl DayStrategy for FullDataset {
    fn name(&self) -> &'static str {
        "full_dataset"
    }

    fn load(&self, ctx: &mut LoadContext<'_>, key: &DayKey) -> Result<Vec<DayRecord>> {
        let dataset = ctx.session.dataset(&key.ticker, ctx.remote)?;
        let raw = dataset
            .day(&key.date)
            .ok_or_else(|| LoadError::NotFound(format!("{} has no day {}", key.ticker, key.date)))?;
        Ok(normalize_day(raw))
    }
}

/// A successfully resolved day.
#[derive(Debug)]
pub struct ResolvedDay {
    pub key: DayKey,
    pub records: Vec<DayRecord>,
    /// Name of the strategy that produced the records.
    pub strategy: &'static str,
    /// Strategies that failed before the winning one.
    pub failures: Vec<StrategyFailure>,
}

/// Ordered strategy runner.
pub struct DataSourceResolver {
    strategies: Vec<Box<dyn DayStrategy>>,
    remote: Option<Rc<dyn RemoteSource>>,
    extract: ExtractOptions,
}

impl DataSourceResolver {
    /// Resolver with the standard four strategies.
    pub fn new(remote: Option<Rc<dyn RemoteSource>>, extract: ExtractOptions) -> Self {
        Self::with_strategies(
            vec![
                Box::new(LocalDayFile),
                Box::new(RemoteDayFile),
                Box::new(StreamExtract),
                Box::new(FullDataset),
            ],
            remote,
            extract,
        )
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn DayStrategy>>,
        remote: Option<Rc<dyn RemoteSource>>,
        extract: ExtractOptions,
    ) -> Self {
        Self {
            strategies,
            remote,
            extract,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn remote(&self) -> Option<&dyn RemoteSource> {
        self.remote.as_deref()
    }

    pub fn has_network(&self) -> bool {
        self.remote.is_some()
    }

    /// Load one day, trying strategies strictly in order.
    pub fn resolve(&self, session: &mut SessionStore, ticker: &str, date: &str) -> Result<ResolvedDay> {
        let key = DayKey::new(ticker, date);
        let mut ctx = LoadContext {
            session,
            remote: self.remote.as_deref(),
            extract: &self.extract,
        };
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.load(&mut ctx, &key) {
                Ok(records) => {
                    info!(%key, strategy = strategy.name(), records = records.len(), "day resolved");
                    return Ok(ResolvedDay {
                        key,
                        records,
                        strategy: strategy.name(),
                        failures,
                    });
                }
                Err(error) => {
                    match &error {
                        LoadError::SourceUnavailable(_) | LoadError::NotFound(_) => {
                            debug!(%key, strategy = strategy.name(), %error, "strategy skipped")
                        }
                        _ => warn!(%key, strategy = strategy.name(), %error, "strategy failed, falling back"),
                    }
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        Err(LoadError::Exhausted {
            ticker: key.ticker,
            date: key.date,
            attempts: failures,
        })
    }
}
