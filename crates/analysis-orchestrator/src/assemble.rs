//! Builds the outward payload shapes from settled feed outcomes.

use chrono::Utc;
use sentiment_core::{
    AnalysisReport, CompanyProfile, FeedError, PriceQuote, PriceSeries, QuoteError,
    ScoredNewsItem, Section, SentimentDistribution, Ticker,
};

/// Assembles the full report. Each section carries its own outcome;
/// nothing here can fail.
pub fn assemble_report(
    ticker: Ticker,
    price: Result<PriceSeries, FeedError>,
    profile: Result<CompanyProfile, FeedError>,
    news: Result<Vec<ScoredNewsItem>, FeedError>,
    sentiment: SentimentDistribution,
) -> AnalysisReport {
    AnalysisReport {
        ticker,
        generated_at: Utc::now(),
        price_history: Section::from_outcome(price),
        profile: Section::from_outcome(profile),
        news: Section::from_outcome(news),
        sentiment,
    }
}

/// Derives the price-only payload from a profile fetch. Unlike the full
/// report this is all-or-nothing: a profile with no price fields at all is
/// an error, not a quote of `None`s.
pub fn assemble_quote(
    ticker: Ticker,
    profile: Result<CompanyProfile, FeedError>,
) -> Result<PriceQuote, QuoteError> {
    let profile = profile?;
    if !profile.has_price_data() {
        return Err(QuoteError::MissingPriceData);
    }
    Ok(PriceQuote::derive(
        ticker,
        profile.current_price,
        profile.previous_close,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_profile;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[test]
    fn report_sections_reflect_individual_outcomes() {
        let report = assemble_report(
            ticker(),
            Err(FeedError::Timeout),
            Ok(sample_profile()),
            Ok(Vec::new()),
            SentimentDistribution::default(),
        );

        assert!(report.price_history.failed());
        assert_eq!(
            report.price_history.error.as_deref(),
            Some("request timed out")
        );
        assert!(!report.profile.failed());
        assert!(!report.news.failed());
        assert!(!report.all_sections_failed());
    }

    #[test]
    fn quote_from_healthy_profile() {
        let quote = assemble_quote(ticker(), Ok(sample_profile())).unwrap();
        assert_eq!(quote.current_price, Some(150.0));
        assert_eq!(quote.previous_close, Some(100.0));
        assert_eq!(quote.change, Some(50.0));
        assert_eq!(quote.change_pct, Some(50.0));
    }

    #[test]
    fn quote_with_only_current_price_still_succeeds() {
        let profile = CompanyProfile {
            current_price: Some(42.0),
            previous_close: None,
            ..Default::default()
        };
        let quote = assemble_quote(ticker(), Ok(profile)).unwrap();
        assert_eq!(quote.current_price, Some(42.0));
        assert_eq!(quote.change, None);
        assert_eq!(quote.change_pct, None);
    }

    #[test]
    fn quote_without_any_price_fields_is_an_error() {
        let profile = CompanyProfile {
            name: Some("Shell Co".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            assemble_quote(ticker(), Ok(profile)),
            Err(QuoteError::MissingPriceData)
        ));
    }

    #[test]
    fn quote_propagates_feed_errors() {
        assert!(matches!(
            assemble_quote(ticker(), Err(FeedError::NotFound)),
            Err(QuoteError::Feed(FeedError::NotFound))
        ));
    }
}
