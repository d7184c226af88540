//! Day loading: sources, streaming extraction, normalization and resolution

pub mod dates;
pub mod error;
pub mod extract;
pub mod local;
pub mod normalize;
pub mod remote;
pub mod resolver;
pub mod session;

pub use dates::{DatesLookup, TickerDateIndex};
pub use error::{LoadError, StrategyFailure};
pub use extract::{extract_day, DayExtractor, ExtractOptions};
pub use local::LocalFileIndex;
pub use normalize::{normalize_day, normalize_day_bytes};
pub use remote::{HttpRemote, MemoryRemote, RemoteSource};
pub use resolver::{
    DataSourceResolver, DayStrategy, FullDataset, LoadContext, LocalDayFile, RemoteDayFile,
    ResolvedDay, StreamExtract,
};
pub use session::SessionStore;
