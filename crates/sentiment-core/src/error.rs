use thiserror::Error;

/// Outcome of a failed external feed call. Every feed is independently
/// optional, so these are values handed back to the caller, never panics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("request timed out")]
    Timeout,

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited by data source")]
    RateLimited,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl FeedError {
    /// Transient errors are worth another attempt; a definitive
    /// not-found or a malformed body is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Timeout | FeedError::RateLimited | FeedError::Network(_) => true,
            FeedError::Http(status) => *status >= 500,
            FeedError::NotFound | FeedError::Decode(_) => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickerError {
    #[error("ticker symbol cannot be empty")]
    Empty,

    #[error("ticker symbol length {0} exceeds max 10")]
    TooLong(usize),

    #[error("ticker symbol contains invalid character '{0}'")]
    InvalidChar(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarError {
    #[error("bar high must be >= low")]
    InvalidRange,

    #[error("bar open/close must be within high/low range")]
    InvalidBounds,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid range '{0}', expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y")]
pub struct InvalidRange(pub String);

/// Per-item classification failure. Skips that item only; it is excluded
/// from the scored list and the distribution denominator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("text is empty or whitespace-only")]
    EmptyText,

    #[error("text length {len} exceeds model input limit {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("classifier backend error: {0}")]
    Backend(String),
}

/// Terminal classifier initialization failure. Cached for the process
/// lifetime by the classifier cache; cloneable so every caller gets a copy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelInitError {
    #[error("sentiment model unavailable: {0}")]
    Unavailable(String),

    #[error("model label set mismatch: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
}

/// Failure of the price-only path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("profile carries no price data")]
    MissingPriceData,
}
