use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BarError, FeedError, InvalidRange, TickerError};

/// Raw label strings the sentiment model is expected to emit, pinned
/// explicitly so a model swap with a different label set is caught at
/// initialization instead of silently mislabeling.
pub const MODEL_LABELS: &[&str] = &["positive", "negative", "neutral"];

/// Normalized stock symbol (uppercase alphanumeric).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }
        if trimmed.len() > 10 {
            return Err(TickerError::TooLong(trimmed.len()));
        }
        if let Some(ch) = trimmed.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TickerError::InvalidChar(ch));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One OHLCV sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    pub fn validate(&self) -> Result<(), BarError> {
        if self.high < self.low {
            return Err(BarError::InvalidRange);
        }
        if self.open > self.high
            || self.close > self.high
            || self.open < self.low
            || self.close < self.low
        {
            return Err(BarError::InvalidBounds);
        }
        Ok(())
    }
}

/// Chronologically ordered price history for a ticker. May be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: Ticker,
    pub points: Vec<PricePoint>,
}

/// Requested span of price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl HistoryRange {
    pub fn as_query(&self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::TwoYears => "2y",
            HistoryRange::FiveYears => "5y",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 91,
            HistoryRange::SixMonths => 182,
            HistoryRange::OneYear => 365,
            HistoryRange::TwoYears => 730,
            HistoryRange::FiveYears => 1825,
        }
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        HistoryRange::SixMonths
    }
}

impl FromStr for HistoryRange {
    type Err = InvalidRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(HistoryRange::OneMonth),
            "3mo" => Ok(HistoryRange::ThreeMonths),
            "6mo" => Ok(HistoryRange::SixMonths),
            "1y" => Ok(HistoryRange::OneYear),
            "2y" => Ok(HistoryRange::TwoYears),
            "5y" => Ok(HistoryRange::FiveYears),
            other => Err(InvalidRange(other.to_string())),
        }
    }
}

/// Descriptive company metadata plus the latest quote fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub business_summary: Option<String>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
}

impl CompanyProfile {
    pub fn has_price_data(&self) -> bool {
        self.current_price.is_some() || self.previous_close.is_some()
    }
}

/// One news headline/snippet as delivered by the feed. `text` is the raw
/// string handed to the classifier and never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
    #[serde(skip)]
    pub text: String,
}

/// Closed sentiment label set. Any raw model output is funneled into one
/// of these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Pinned lookup from raw model labels. Positional/index conventions
    /// are deliberately not used here.
    pub fn from_model_label(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "negative" => Some(SentimentLabel::Negative),
            "neutral" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

/// Per-item classifier output: the winning label and the model's
/// confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
}

/// A news item paired with its sentiment, in feed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNewsItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
}

impl ScoredNewsItem {
    pub fn new(item: NewsItem, sentiment: SentimentResult) -> Self {
        Self {
            item,
            sentiment_label: sentiment.label,
            sentiment_score: sentiment.score,
        }
    }
}

/// Aggregate label breakdown over the successfully scored items, as
/// percentages rounded to one decimal. All-zero when nothing was scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub scored: usize,
}

impl SentimentDistribution {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = SentimentLabel>,
    {
        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut neutral = 0usize;
        for label in labels {
            match label {
                SentimentLabel::Positive => positive += 1,
                SentimentLabel::Negative => negative += 1,
                SentimentLabel::Neutral => neutral += 1,
            }
        }

        let total = positive + negative + neutral;
        if total == 0 {
            return Self::default();
        }

        let pct = |count: usize| (count as f64 / total as f64 * 1000.0).round() / 10.0;
        Self {
            positive: pct(positive),
            negative: pct(negative),
            neutral: pct(neutral),
            scored: total,
        }
    }
}

/// One independently-fetched section of the full report. The JSON shape
/// always carries both keys: `data` on success, `error` on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Section<T> {
    pub fn ok(value: T) -> Self {
        Self {
            data: Some(value),
            error: None,
        }
    }

    pub fn from_outcome(outcome: Result<T, FeedError>) -> Self {
        match outcome {
            Ok(value) => Self::ok(value),
            Err(e) => Self {
                data: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Full analysis payload. Assembled fresh per request; each section
/// reflects its own feed outcome, so one failure never hard-fails the
/// report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: Ticker,
    pub generated_at: DateTime<Utc>,
    pub price_history: Section<PriceSeries>,
    pub profile: Section<CompanyProfile>,
    pub news: Section<Vec<ScoredNewsItem>>,
    pub sentiment: SentimentDistribution,
}

impl AnalysisReport {
    /// True only when every section failed; the transport layer uses this
    /// to pick between partial-data 200 and a gateway error.
    pub fn all_sections_failed(&self) -> bool {
        self.price_history.failed() && self.profile.failed() && self.news.failed()
    }
}

/// Lightweight price-only payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub ticker: Ticker,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
}

impl PriceQuote {
    /// Derives change fields. `change_pct` stays `None` when the previous
    /// close is absent or zero.
    pub fn derive(ticker: Ticker, current: Option<f64>, previous: Option<f64>) -> Self {
        let change = match (current, previous) {
            (Some(c), Some(p)) => Some(c - p),
            _ => None,
        };
        let change_pct = match (change, previous) {
            (Some(ch), Some(p)) if p != 0.0 => Some(ch / p * 100.0),
            _ => None,
        };
        Self {
            ticker,
            current_price: current,
            previous_close: previous,
            change,
            change_pct,
        }
    }
}
