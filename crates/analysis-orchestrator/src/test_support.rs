//! Hand-rolled stubs for the trait seams, shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sentiment_core::{
    Classifier, ClassifierProvider, ClassifyError, CompanyProfile, FeedError, HistoryRange,
    MarketFeed, ModelInitError, NewsItem, PricePoint, PriceSeries, SentimentLabel,
    SentimentResult, Ticker,
};

pub fn news_item(title: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        publisher: Some("Newswire".to_string()),
        published_at: Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap(),
        url: "https://example.com/article".to_string(),
        text: title.to_string(),
    }
}

pub fn sample_series(ticker: &Ticker) -> PriceSeries {
    let point = |day, close| PricePoint {
        timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1_000_000.0,
    };
    PriceSeries {
        ticker: ticker.clone(),
        points: vec![point(2, 148.0), point(3, 150.0)],
    }
}

pub fn sample_profile() -> CompanyProfile {
    CompanyProfile {
        name: Some("Apple Inc.".to_string()),
        sector: Some("Technology".to_string()),
        industry: Some("Consumer Electronics".to_string()),
        business_summary: None,
        market_cap: Some(2.9e12),
        current_price: Some(150.0),
        previous_close: Some(100.0),
    }
}

/// Feed stub with one pre-canned outcome per leg and per-leg call counters.
pub struct StubFeed {
    pub price: Result<PriceSeries, FeedError>,
    pub profile: Result<CompanyProfile, FeedError>,
    pub news: Result<Vec<NewsItem>, FeedError>,
    pub price_calls: Arc<AtomicUsize>,
    pub profile_calls: Arc<AtomicUsize>,
    pub news_calls: Arc<AtomicUsize>,
}

impl StubFeed {
    pub fn healthy() -> Self {
        let ticker = Ticker::parse("AAPL").unwrap();
        Self {
            price: Ok(sample_series(&ticker)),
            profile: Ok(sample_profile()),
            news: Ok(vec![news_item("Shares surge after earnings beat")]),
            price_calls: Arc::new(AtomicUsize::new(0)),
            profile_calls: Arc::new(AtomicUsize::new(0)),
            news_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_price(mut self, outcome: Result<PriceSeries, FeedError>) -> Self {
        self.price = outcome;
        self
    }

    pub fn with_profile(mut self, outcome: Result<CompanyProfile, FeedError>) -> Self {
        self.profile = outcome;
        self
    }

    pub fn with_news(mut self, outcome: Result<Vec<NewsItem>, FeedError>) -> Self {
        self.news = outcome;
        self
    }
}

#[async_trait]
impl MarketFeed for StubFeed {
    async fn fetch_price_history(
        &self,
        _ticker: &Ticker,
        _range: HistoryRange,
    ) -> Result<PriceSeries, FeedError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.price.clone()
    }

    async fn fetch_profile(&self, _ticker: &Ticker) -> Result<CompanyProfile, FeedError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile.clone()
    }

    async fn fetch_news(
        &self,
        _ticker: &Ticker,
        _limit: u32,
    ) -> Result<Vec<NewsItem>, FeedError> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        self.news.clone()
    }
}

/// Deterministic keyword classifier with a small input limit so oversize
/// exclusion is easy to exercise.
#[derive(Default)]
pub struct StubClassifier;

pub const STUB_MAX_INPUT_CHARS: usize = 80;

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClassifyError::EmptyText);
        }
        let len = trimmed.chars().count();
        if len > STUB_MAX_INPUT_CHARS {
            return Err(ClassifyError::InputTooLong {
                len,
                max: STUB_MAX_INPUT_CHARS,
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        let (label, score) = if lower.contains("beat") || lower.contains("surge") {
            (SentimentLabel::Positive, 0.92)
        } else if lower.contains("recall") || lower.contains("probe") || lower.contains("miss") {
            (SentimentLabel::Negative, 0.88)
        } else {
            (SentimentLabel::Neutral, 0.65)
        };

        Ok(SentimentResult { label, score })
    }

    fn max_input_chars(&self) -> usize {
        STUB_MAX_INPUT_CHARS
    }
}

/// Provider stub: hands out a shared stub classifier or a canned init
/// failure, counting calls either way.
pub struct StubProvider {
    pub outcome: Result<Arc<dyn Classifier>, ModelInitError>,
    pub calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn healthy() -> Self {
        Self {
            outcome: Ok(Arc::new(StubClassifier)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: ModelInitError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ClassifierProvider for StubProvider {
    async fn classifier(&self) -> Result<Arc<dyn Classifier>, ModelInitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
