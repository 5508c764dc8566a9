//! Per-item scoring and distribution aggregation over a news batch.

use sentiment_core::{
    Classifier, ClassifyError, NewsItem, ScoredNewsItem, SentimentDistribution,
};

/// Scores each news item and folds the winning labels into a distribution.
///
/// Items whose text is blank, over the classifier's input limit, or
/// rejected by the backend are dropped from the output rather than failing
/// the batch. Surviving items keep their feed order.
pub async fn score_and_aggregate(
    classifier: &dyn Classifier,
    items: &[NewsItem],
) -> (Vec<ScoredNewsItem>, SentimentDistribution) {
    let mut scored = Vec::with_capacity(items.len());

    for item in items {
        if item.text.trim().is_empty() {
            tracing::debug!(title = %item.title, "skipping item with no text");
            continue;
        }

        match classifier.classify(&item.text).await {
            Ok(sentiment) => scored.push(ScoredNewsItem::new(item.clone(), sentiment)),
            Err(e @ (ClassifyError::EmptyText | ClassifyError::InputTooLong { .. })) => {
                tracing::debug!(title = %item.title, error = %e, "item rejected before inference");
            }
            Err(e @ ClassifyError::Backend(_)) => {
                tracing::warn!(title = %item.title, error = %e, "classification failed");
            }
        }
    }

    let distribution =
        SentimentDistribution::from_labels(scored.iter().map(|s| s.sentiment_label));
    (scored, distribution)
}
