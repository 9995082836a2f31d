use thiserror::Error;

/// Failures of the one-shot load at session start.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The backing store could not be reached or read. Fatal for the session.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    /// Zero rows survived normalization. Callers show a "no data" state.
    #[error("No listings survived normalization ({dropped} of {fetched} rows dropped)")]
    EmptyDataset { fetched: usize, dropped: usize },
}

impl LoadError {
    /// Whether the session can continue with an empty view.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LoadError::EmptyDataset { .. })
    }
}

/// Per-call aggregation failures; callers substitute a placeholder.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Histogram needs at least one bucket")]
    ZeroBuckets,
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
