use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use sentiment_core::{
    CompanyProfile, FeedError, HistoryRange, MarketFeed, NewsItem, PricePoint, PriceSeries,
    Ticker,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-ish user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Per-feed timeout and retry parameters.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = std::env::var("FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = std::env::var("FEED_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.max_retries = retries;
        }
        config
    }
}

/// Client for the three Yahoo Finance feeds: daily price history (chart),
/// company profile (quoteSummary) and recent news (search).
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    config: FeedConfig,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: FeedConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// GET with bounded retries and exponential backoff on transient
    /// failures. Definitive outcomes (404, malformed body) return at once.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FeedError> {
        let mut last_err = FeedError::Network("no attempt made".to_string());

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.backoff_base * 2u32.pow(attempt - 1);
                tracing::debug!(url, attempt, ?delay, "retrying feed request");
                tokio::time::sleep(delay).await;
            }

            match self.try_get_json::<T>(url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(url, attempt, error = %e, "transient feed error");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    async fn try_get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FeedError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout
                } else {
                    FeedError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            404 => return Err(FeedError::NotFound),
            429 => return Err(FeedError::RateLimited),
            s if !status.is_success() => return Err(FeedError::Http(s)),
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketFeed for YahooClient {
    async fn fetch_price_history(
        &self,
        ticker: &Ticker,
        range: HistoryRange,
    ) -> Result<PriceSeries, FeedError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response: ChartResponse = self
            .get_json(
                &url,
                &[
                    ("range", range.as_query().to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "div,splits".to_string()),
                ],
            )
            .await?;

        map_chart(ticker, response)
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, FeedError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let response: QuoteSummaryResponse = self
            .get_json(&url, &[("modules", "assetProfile,price".to_string())])
            .await?;

        map_profile(response)
    }

    async fn fetch_news(&self, ticker: &Ticker, limit: u32) -> Result<Vec<NewsItem>, FeedError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let response: SearchResponse = self
            .get_json(
                &url,
                &[
                    ("q", ticker.to_string()),
                    ("newsCount", limit.to_string()),
                    ("quotesCount", "0".to_string()),
                ],
            )
            .await?;

        Ok(map_news(response))
    }
}

/// Converts the chart payload into a chronological price series. Rows with
/// missing OHLC fields or inconsistent bounds are dropped.
fn map_chart(ticker: &Ticker, response: ChartResponse) -> Result<PriceSeries, FeedError> {
    if let Some(err) = response.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(FeedError::NotFound);
        }
        return Err(FeedError::Decode(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or(FeedError::NotFound)?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = row else {
            continue;
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };

        let point = PricePoint {
            timestamp,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        };
        if let Err(e) = point.validate() {
            tracing::debug!(%ticker, %timestamp, error = %e, "dropping inconsistent bar");
            continue;
        }
        points.push(point);
    }

    Ok(PriceSeries {
        ticker: ticker.clone(),
        points,
    })
}

fn map_profile(response: QuoteSummaryResponse) -> Result<CompanyProfile, FeedError> {
    if let Some(err) = response.quote_summary.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(FeedError::NotFound);
        }
        return Err(FeedError::Decode(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let result = response
        .quote_summary
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or(FeedError::NotFound)?;

    let asset = result.asset_profile.unwrap_or_default();
    let price = result.price.unwrap_or_default();

    Ok(CompanyProfile {
        name: price.long_name.or(price.short_name),
        sector: asset.sector,
        industry: asset.industry,
        business_summary: asset.long_business_summary,
        market_cap: price.market_cap.and_then(|v| v.raw),
        current_price: price.regular_market_price.and_then(|v| v.raw),
        previous_close: price.regular_market_previous_close.and_then(|v| v.raw),
    })
}

fn map_news(response: SearchResponse) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .map(|n| {
            let text = n.title.clone();
            NewsItem {
                title: n.title,
                publisher: n.publisher,
                published_at: DateTime::<Utc>::from_timestamp(n.provider_publish_time, 0)
                    .unwrap_or_else(Utc::now),
                url: n.link,
                text,
            }
        })
        .collect()
}

// Chart (price history) response structures

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

// quoteSummary (profile) response structures

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "assetProfile")]
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    #[serde(rename = "longBusinessSummary")]
    long_business_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<RawValue>,
    #[serde(rename = "regularMarketPreviousClose")]
    regular_market_previous_close: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 123.4, "fmt": "123.40"}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

// Search (news) response structures

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
struct SearchNewsItem {
    title: String,
    publisher: Option<String>,
    link: String,
    #[serde(rename = "providerPublishTime", default)]
    provider_publish_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[test]
    fn chart_mapping_drops_null_rows() {
        let payload = json!({
            "chart": {
                "result": [{
                    "timestamp": [1704153600i64, 1704240000i64, 1704326400i64],
                    "indicators": {
                        "quote": [{
                            "open":   [185.0, null, 187.0],
                            "high":   [186.5, 188.0, 189.0],
                            "low":    [184.0, 185.0, 186.0],
                            "close":  [186.0, 187.5, 188.5],
                            "volume": [50_000_000.0, 48_000_000.0, null]
                        }]
                    }
                }],
                "error": null
            }
        });
        let response: ChartResponse = serde_json::from_value(payload).unwrap();
        let series = map_chart(&ticker(), response).unwrap();

        // middle row has a null open and is dropped; missing volume is 0
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].close, 186.0);
        assert_eq!(series.points[1].volume, 0.0);
        assert!(series.points[0].timestamp < series.points[1].timestamp);
    }

    #[test]
    fn chart_mapping_reports_not_found() {
        let payload = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        });
        let response: ChartResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(map_chart(&ticker(), response).unwrap_err(), FeedError::NotFound);
    }

    #[test]
    fn profile_mapping_unwraps_raw_values() {
        let payload = json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": {
                        "sector": "Technology",
                        "industry": "Consumer Electronics",
                        "longBusinessSummary": "Designs and sells devices."
                    },
                    "price": {
                        "longName": "Apple Inc.",
                        "shortName": "Apple",
                        "marketCap": {"raw": 2.9e12, "fmt": "2.9T"},
                        "regularMarketPrice": {"raw": 186.0, "fmt": "186.00"},
                        "regularMarketPreviousClose": {"raw": 184.5, "fmt": "184.50"}
                    }
                }],
                "error": null
            }
        });
        let response: QuoteSummaryResponse = serde_json::from_value(payload).unwrap();
        let profile = map_profile(response).unwrap();

        assert_eq!(profile.name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.current_price, Some(186.0));
        assert_eq!(profile.previous_close, Some(184.5));
        assert!(profile.has_price_data());
    }

    #[test]
    fn profile_mapping_tolerates_missing_modules() {
        let payload = json!({
            "quoteSummary": {
                "result": [{"price": {"shortName": "Apple"}}],
                "error": null
            }
        });
        let response: QuoteSummaryResponse = serde_json::from_value(payload).unwrap();
        let profile = map_profile(response).unwrap();

        assert_eq!(profile.name.as_deref(), Some("Apple"));
        assert!(profile.sector.is_none());
        assert!(!profile.has_price_data());
    }

    #[test]
    fn news_mapping_preserves_feed_order_and_sets_text() {
        let payload = json!({
            "news": [
                {"title": "Apple beats estimates", "publisher": "Reuters",
                 "link": "https://example.com/a", "providerPublishTime": 1704240000i64},
                {"title": "Supplier recall widens", "publisher": "Bloomberg",
                 "link": "https://example.com/b", "providerPublishTime": 1704153600i64}
            ]
        });
        let response: SearchResponse = serde_json::from_value(payload).unwrap();
        let items = map_news(response);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Apple beats estimates");
        assert_eq!(items[0].text, items[0].title);
        assert_eq!(items[1].publisher.as_deref(), Some("Bloomberg"));
    }

    #[test]
    fn empty_news_payload_is_a_valid_empty_list() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(map_news(response).is_empty());
    }

    #[test]
    fn retryability_classification() {
        assert!(FeedError::Timeout.is_retryable());
        assert!(FeedError::RateLimited.is_retryable());
        assert!(FeedError::Http(503).is_retryable());
        assert!(FeedError::Network("reset".into()).is_retryable());
        assert!(!FeedError::NotFound.is_retryable());
        assert!(!FeedError::Http(400).is_retryable());
        assert!(!FeedError::Decode("bad json".into()).is_retryable());
    }
}
