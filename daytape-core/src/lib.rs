//! DayTape Core: loading and inspecting single trading days of intraday data.
//!
//! This crate contains:
//! - Domain types (day records, ticker datasets, manifest, day keys)
//! - Local and remote sources, the streaming day extractor and the ordered
//!   fallback resolver
//! - Minute aggregation, rolling volatility and the per-index day view
//! - The headless viewer model driving selection and scrubbing
//! - Data-tree tooling (manifest generation, per-day split, ticker discovery)

pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod tree;
pub mod viewer;

pub use config::{ConfigError, DayTapeConfig};
pub use data::{DataSourceResolver, LoadError, SessionStore};
pub use viewer::{DatesState, DayState, Viewer};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: plain data types stay Send + Sync.
    ///
    /// The tree tooling moves these across rayon workers. The session and
    /// viewer hold `Rc` and are not checked.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DayRecord>();
        require_sync::<domain::DayRecord>();
        require_send::<domain::TickerDataset>();
        require_sync::<domain::TickerDataset>();
        require_send::<domain::Manifest>();
        require_sync::<domain::Manifest>();
        require_send::<domain::DayKey>();
        require_sync::<domain::DayKey>();

        require_send::<data::LoadError>();
        require_sync::<data::LoadError>();
        require_send::<data::ExtractOptions>();
        require_sync::<data::ExtractOptions>();
        require_send::<data::LocalFileIndex>();
        require_sync::<data::LocalFileIndex>();

        require_send::<analytics::DayView>();
        require_sync::<analytics::DayView>();
        require_send::<analytics::Snapshot>();
        require_sync::<analytics::Snapshot>();

        require_send::<config::DayTapeConfig>();
        require_sync::<config::DayTapeConfig>();
        require_send::<tree::TreeError>();
        require_sync::<tree::TreeError>();
    }

    /// Strategies see the session only through `LoadContext`, so a strategy
    /// cannot touch viewer selection state.
    #[test]
    fn day_strategy_is_object_safe() {
        fn _check_trait_object_builds(
            strategy: &dyn data::DayStrategy,
            ctx: &mut data::LoadContext<'_>,
            key: &domain::DayKey,
        ) -> data::error::Result<Vec<domain::DayRecord>> {
            strategy.load(ctx, key)
        }
    }
}
