//! Derived values for a loaded day: minute closes, returns, volatility

pub mod day_view;
pub mod minute;
pub mod volatility;

pub use day_view::{DayView, Snapshot};
pub use minute::{log_returns, MinuteSeries};
pub use volatility::{annualization_factor, sample_std_dev, RollingVolatility, DEFAULT_WINDOW, MIN_WINDOW};
