use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sentiment_core::{
    AnalysisReport, ClassifierProvider, CompanyProfile, FeedError, HistoryRange, MarketFeed,
    ModelInitError, NewsItem, PriceQuote, PriceSeries, QuoteError, SentimentDistribution, Ticker,
};

pub mod aggregate;
pub mod assemble;

pub use aggregate::score_and_aggregate;
pub use assemble::{assemble_quote, assemble_report};

#[cfg(test)]
pub(crate) mod test_support;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

const CACHE_TTL_SECS: i64 = 300; // 5 minutes
const DEFAULT_NEWS_LIMIT: u32 = 25;

/// The three feed outcomes for one ticker. Each leg settles independently;
/// the caller decides how to degrade.
#[derive(Debug)]
pub struct IngestedData {
    pub price: Result<PriceSeries, FeedError>,
    pub profile: Result<CompanyProfile, FeedError>,
    pub news: Result<Vec<NewsItem>, FeedError>,
}

/// Runs the ingestion-scoring-assembly pipeline for one ticker per call.
/// Feed responses are cached for a short TTL; the classifier handle is the
/// only cross-request shared resource beyond these caches.
pub struct AnalysisOrchestrator {
    feed: Arc<dyn MarketFeed>,
    classifier_provider: Arc<dyn ClassifierProvider>,
    news_limit: u32,
    history_cache: DashMap<String, CacheEntry<PriceSeries>>,
    profile_cache: DashMap<String, CacheEntry<CompanyProfile>>,
    news_cache: DashMap<String, CacheEntry<Vec<NewsItem>>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        classifier_provider: Arc<dyn ClassifierProvider>,
    ) -> Self {
        let news_limit = std::env::var("NEWS_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_NEWS_LIMIT);

        Self {
            feed,
            classifier_provider,
            news_limit,
            history_cache: DashMap::new(),
            profile_cache: DashMap::new(),
            news_cache: DashMap::new(),
        }
    }

    /// Fetch price history, profile and news concurrently. Waits for all
    /// three legs to settle; no leg's failure aborts another.
    pub async fn ingest(
        &self,
        ticker: &Ticker,
        range: HistoryRange,
        news_limit: u32,
    ) -> IngestedData {
        let (price, profile, news) = tokio::join!(
            self.get_price_history(ticker, range),
            self.get_profile(ticker),
            self.get_news(ticker, news_limit),
        );

        IngestedData {
            price,
            profile,
            news,
        }
    }

    /// Full analysis: ingest, score news sentiment, assemble the report.
    /// Partial feed failures degrade to per-section error markers; a
    /// classifier initialization failure is the only error that fails the
    /// whole call, and only when there is news to score.
    pub async fn analyze(
        &self,
        ticker: &Ticker,
        range: HistoryRange,
        news_limit: Option<u32>,
    ) -> Result<AnalysisReport, ModelInitError> {
        let news_limit = news_limit.unwrap_or(self.news_limit);
        tracing::info!(%ticker, range = range.as_query(), news_limit, "starting analysis");
        let ingested = self.ingest(ticker, range, news_limit).await;

        let (news_outcome, distribution) = match ingested.news {
            Ok(items) if !items.is_empty() => {
                let classifier = self.classifier_provider.classifier().await?;
                let (scored, distribution) =
                    aggregate::score_and_aggregate(classifier.as_ref(), &items).await;
                tracing::info!(%ticker, fetched = items.len(), scored = scored.len(), "news scored");
                (Ok(scored), distribution)
            }
            Ok(_) => {
                tracing::info!(%ticker, "no recent news coverage");
                (Ok(Vec::new()), SentimentDistribution::default())
            }
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "news feed failed");
                (Err(e), SentimentDistribution::default())
            }
        };

        Ok(assemble::assemble_report(
            ticker.clone(),
            ingested.price,
            ingested.profile,
            news_outcome,
            distribution,
        ))
    }

    /// Lightweight price-only path. Never touches the classifier.
    pub async fn price_quote(&self, ticker: &Ticker) -> Result<PriceQuote, QuoteError> {
        let profile = self.get_profile(ticker).await;
        assemble::assemble_quote(ticker.clone(), profile)
    }

    /// Get price history for a ticker (cached, 5-min TTL)
    pub async fn get_price_history(
        &self,
        ticker: &Ticker,
        range: HistoryRange,
    ) -> Result<PriceSeries, FeedError> {
        let cache_key = format!("{}:{}", ticker, range.as_query());
        if let Some(entry) = self.history_cache.get(&cache_key) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < CACHE_TTL_SECS {
                return Ok(entry.data.clone());
            }
        }

        let series = self.feed.fetch_price_history(ticker, range).await?;

        self.history_cache.insert(
            cache_key,
            CacheEntry {
                data: series.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(series)
    }

    /// Get the company profile (cached, 5-min TTL)
    pub async fn get_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, FeedError> {
        let cache_key = ticker.to_string();
        if let Some(entry) = self.profile_cache.get(&cache_key) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < CACHE_TTL_SECS {
                return Ok(entry.data.clone());
            }
        }

        let profile = self.feed.fetch_profile(ticker).await?;

        self.profile_cache.insert(
            cache_key,
            CacheEntry {
                data: profile.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(profile)
    }

    /// Get recent news for a ticker (cached, 5-min TTL)
    pub async fn get_news(&self, ticker: &Ticker, limit: u32) -> Result<Vec<NewsItem>, FeedError> {
        let cache_key = format!("news:{}:{}", ticker, limit);
        if let Some(entry) = self.news_cache.get(&cache_key) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < CACHE_TTL_SECS {
                return Ok(entry.data.clone());
            }
        }

        let items = self.feed.fetch_news(ticker, limit).await?;

        self.news_cache.insert(
            cache_key,
            CacheEntry {
                data: items.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(items)
    }
}
