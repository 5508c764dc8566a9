use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    ClassifyError, CompanyProfile, FeedError, HistoryRange, ModelInitError, NewsItem,
    PriceSeries, SentimentResult, Ticker,
};

/// Contract for a market data source. Each method wraps one independent
/// external feed; a failure in one never implies anything about the others.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_price_history(
        &self,
        ticker: &Ticker,
        range: HistoryRange,
    ) -> Result<PriceSeries, FeedError>;

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, FeedError>;

    /// An empty vec is a valid outcome (ticker exists, no recent coverage),
    /// distinct from a `FeedError`.
    async fn fetch_news(&self, ticker: &Ticker, limit: u32) -> Result<Vec<NewsItem>, FeedError>;
}

/// Contract for a sentiment model backend. Implementations must be
/// deterministic for a fixed model version and safe to call from many
/// tasks concurrently.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassifyError>;

    /// Upper bound, in characters, accepted per text. Longer inputs are
    /// rejected before reaching the backend.
    fn max_input_chars(&self) -> usize;
}

/// Hands out the shared classifier handle, initializing it on first use.
/// `ModelInitError` is terminal for the process lifetime.
#[async_trait]
pub trait ClassifierProvider: Send + Sync {
    async fn classifier(&self) -> Result<Arc<dyn Classifier>, ModelInitError>;
}
