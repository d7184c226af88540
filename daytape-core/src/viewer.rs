//! Headless interaction model: directory, ticker and date selection, and a
//! coalesced scrub cursor over the loaded day.
//!
//! Every day load is tagged with a [`RequestToken`]. Selecting another ticker
//! or date issues a newer token, and a completion carrying an older one is
//! dropped, so a slow load can never overwrite a newer selection.

use crate::analytics::{DayView, RollingVolatility, Snapshot};
use crate::config::{ConfigError, DayTapeConfig};
use crate::data::{
    DataSourceResolver, DatesLookup, HttpRemote, LoadError, LocalFileIndex, RemoteSource,
    ResolvedDay, SessionStore, TickerDateIndex,
};
use crate::domain::RequestToken;
use crate::tree::discover_tickers;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Outcome of selecting a ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatesState {
    Loaded(Vec<String>),
    Unavailable(String),
}

/// Outcome of selecting a date.
#[derive(Debug, Clone)]
pub enum DayState {
    /// Nothing selected yet.
    Idle,
    Loaded(DayView),
    Empty { diagnostic: String },
}

impl DayState {
    pub fn view(&self) -> Option<&DayView> {
        match self {
            DayState::Loaded(view) => Some(view),
            _ => None,
        }
    }
}

/// Last-write-wins cursor requests between renders.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrubCoalescer {
    pending: Option<usize>,
}

impl ScrubCoalescer {
    pub fn request(&mut self, index: usize) {
        self.pending = Some(index);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The most recent request, clearing it.
    pub fn take(&mut self) -> Option<usize> {
        self.pending.take()
    }
}

pub struct Viewer {
    session: SessionStore,
    resolver: DataSourceResolver,
    dates: TickerDateIndex,
    volatility: RollingVolatility,
    ticker: Option<String>,
    date: Option<String>,
    day: DayState,
    strategy: Option<&'static str>,
    cursor: usize,
    scrub: ScrubCoalescer,
    latest: RequestToken,
}

impl Viewer {
    pub fn new(remote: Option<Rc<dyn RemoteSource>>, config: &DayTapeConfig) -> Self {
        Self::with_resolver(
            DataSourceResolver::new(remote.clone(), config.extract.clone()),
            remote,
            RollingVolatility::new(config.analytics.volatility_window),
        )
    }

    pub fn with_resolver(
        resolver: DataSourceResolver,
        remote: Option<Rc<dyn RemoteSource>>,
        volatility: RollingVolatility,
    ) -> Self {
        Self {
            session: SessionStore::new(),
            resolver,
            dates: TickerDateIndex::new(remote),
            volatility,
            ticker: None,
            date: None,
            day: DayState::Idle,
            strategy: None,
            cursor: 0,
            scrub: ScrubCoalescer::default(),
            latest: RequestToken(0),
        }
    }

    /// Build from configuration: an HTTP source when `remote.base_url` is set,
    /// and the configured local directory, if any. The config is validated first.
    pub fn from_config(config: &DayTapeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let remote: Option<Rc<dyn RemoteSource>> = config.remote.base_url.as_deref().map(|url| {
            Rc::new(HttpRemote::new(url, config.remote.timeout())) as Rc<dyn RemoteSource>
        });
        let mut viewer = Self::new(remote, config);
        if let Some(root) = &config.local.root {
            viewer.select_directory(root)?;
        }
        Ok(viewer)
    }

    /// Scan `root` as the local data directory. Caches and the current
    /// selection are cleared on success only.
    pub fn select_directory(&mut self, root: &Path) -> Result<&LocalFileIndex, LoadError> {
        self.session.select_directory(root)?;
        self.clear_selection();
        Ok(self.session.local())
    }

    fn clear_selection(&mut self) {
        self.ticker = None;
        self.date = None;
        self.day = DayState::Idle;
        self.strategy = None;
        self.cursor = 0;
        self.scrub = ScrubCoalescer::default();
        self.latest = self.latest.next();
    }

    /// Tickers offered by the local directory or the remote tree.
    pub fn tickers(&mut self) -> Vec<String> {
        let manifest = if self.session.local().is_empty() {
            self.dates.manifest(&mut self.session)
        } else {
            Rc::default()
        };
        discover_tickers(self.session.local(), self.resolver.remote(), &manifest)
    }

    /// Make `ticker` current without listing its dates.
    pub fn focus_ticker(&mut self, ticker: &str) {
        self.clear_selection();
        self.ticker = Some(ticker.to_string());
    }

    /// Select `ticker` and list its dates.
    ///
    /// When no cheap index knows the ticker, the full dataset is loaded and its
    /// keys used. Local per-day files are the last resort.
    pub fn select_ticker(&mut self, ticker: &str) -> DatesState {
        self.focus_ticker(ticker);

        if let DatesLookup::Known(dates) = self.dates.lookup(&mut self.session, ticker) {
            return DatesState::Loaded(dates);
        }

        match self.session.dataset(ticker, self.resolver.remote()) {
            Ok(dataset) => {
                info!(
                    ticker,
                    "dates derived from the full dataset; generate a manifest for faster listing"
                );
                DatesState::Loaded(dataset.dates())
            }
            Err(e) => {
                let local = self.session.local().day_dates(ticker);
                if !local.is_empty() {
                    debug!(ticker, dates = local.len(), "dates from local day files");
                    return DatesState::Loaded(local);
                }
                warn!(ticker, error = %e, "no dates available");
                DatesState::Unavailable(format!("failed to load dates for {ticker}: {e}"))
            }
        }
    }

    /// Load `date` for the selected ticker. The cursor starts at the last record.
    pub fn select_date(&mut self, date: &str) -> &DayState {
        let token = self.begin_request();
        let result = match self.ticker.clone() {
            Some(ticker) => self.resolver.resolve(&mut self.session, &ticker, date),
            None => Err(LoadError::NotFound("no ticker selected".into())),
        };
        self.complete_request(token, date, result);
        &self.day
    }

    /// Issue a token for a new day load, invalidating any in flight.
    pub fn begin_request(&mut self) -> RequestToken {
        self.latest = self.latest.next();
        self.latest
    }

    /// Apply a finished load. Returns false, changing nothing, when `token`
    /// is not the latest issued.
    pub fn complete_request(
        &mut self,
        token: RequestToken,
        date: &str,
        result: Result<ResolvedDay, LoadError>,
    ) -> bool {
        if token != self.latest {
            debug!(%token, latest = %self.latest, date, "discarding stale load");
            return false;
        }
        self.date = Some(date.to_string());
        self.scrub = ScrubCoalescer::default();
        match result {
            Ok(resolved) if resolved.records.is_empty() => {
                self.strategy = Some(resolved.strategy);
                self.cursor = 0;
                self.day = DayState::Empty {
                    diagnostic: format!("no records for {}", resolved.key),
                };
            }
            Ok(resolved) => {
                let view = DayView::new(resolved.records, self.volatility);
                self.strategy = Some(resolved.strategy);
                self.cursor = view.last_index().unwrap_or(0);
                self.day = DayState::Loaded(view);
            }
            Err(e) => {
                warn!(date, error = %e, "day unavailable");
                self.strategy = None;
                self.cursor = 0;
                self.day = DayState::Empty {
                    diagnostic: e.to_string(),
                };
            }
        }
        true
    }

    /// Request a cursor move; applied at the next [`Viewer::render`].
    pub fn scrub(&mut self, index: usize) {
        self.scrub.request(index);
    }

    /// Apply the latest pending scrub, if any, and return the snapshot.
    pub fn render(&mut self) -> Option<Snapshot> {
        if let Some(index) = self.scrub.take() {
            if let Some(view) = self.day.view() {
                self.cursor = view.clamp(index);
            }
        }
        self.snapshot()
    }

    /// Snapshot at the current cursor.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.day.view()?.snapshot(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn day(&self) -> &DayState {
        &self.day
    }

    pub fn selected_ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Strategy that produced the current day.
    pub fn strategy(&self) -> Option<&'static str> {
        self.strategy
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn resolver(&self) -> &DataSourceResolver {
        &self.resolver
    }
}
