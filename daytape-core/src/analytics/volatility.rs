//! Rolling realized volatility over minute log returns.
//!
//! Lookback: `window` completed minute returns. Undefined (None) until the
//! minute index reaches `window`.

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Regular-session minutes per trading day.
pub const SESSION_MINUTES: f64 = 390.0;

pub const DEFAULT_WINDOW: usize = 30;

/// Smallest window with a defined sample deviation.
pub const MIN_WINDOW: usize = 2;

/// `sqrt(252 * 390)`.
pub fn annualization_factor() -> f64 {
    (TRADING_DAYS * SESSION_MINUTES).sqrt()
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Annualized volatility over a fixed number of minute returns.
#[derive(Debug, Clone, Copy)]
pub struct RollingVolatility {
    window: usize,
}

impl RollingVolatility {
    /// Windows below two returns have no sample deviation and are raised to 2.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_WINDOW),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Volatility at minute bucket `minute`, using `returns[minute - window..minute]`.
    ///
    /// `returns[j]` is the log return from bucket `j` to `j + 1`.
    pub fn at_minute(&self, returns: &[f64], minute: usize) -> Option<f64> {
        if minute < self.window || minute > returns.len() {
            return None;
        }
        let slice = &returns[minute - self.window..minute];
        Some(sample_std_dev(slice) * annualization_factor())
    }
}

impl Default for RollingVolatility {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
