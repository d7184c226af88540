//! Domain types for DayTape

pub mod dataset;
pub mod ids;
pub mod record;

pub use dataset::{DatesDocument, Manifest, TickerDataset};
pub use ids::{is_date_key, DayKey, RequestToken, DATE_FORMAT};
pub use record::{coerce_number, DayRecord, Field, RawDayRecord, RecordShape};
