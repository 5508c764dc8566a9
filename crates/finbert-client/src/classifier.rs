use std::sync::Arc;

use async_trait::async_trait;
use sentiment_core::{
    Classifier, ClassifyError, ModelInitError, SentimentLabel, SentimentResult, MODEL_LABELS,
};

use crate::client::FinBertClient;
use crate::config::ClassifierConfig;

/// FinBERT truncates around 512 tokens; anything beyond this many
/// characters cannot fit and is rejected before the network call.
pub const MAX_INPUT_CHARS: usize = 2000;

/// `Classifier` backed by the FinBERT inference service. Stateless after
/// construction; safe to share across requests.
pub struct FinBertClassifier {
    client: FinBertClient,
}

#[async_trait]
impl Classifier for FinBertClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClassifyError::EmptyText);
        }
        let len = trimmed.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(ClassifyError::InputTooLong {
                len,
                max: MAX_INPUT_CHARS,
            });
        }

        let texts = [trimmed.to_string()];
        let response = self
            .client
            .predict(&texts)
            .await
            .map_err(|e| ClassifyError::Backend(e.to_string()))?;

        let prediction = response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::Backend("empty prediction set".to_string()))?;

        Ok(SentimentResult {
            label: normalize_label(&prediction.label),
            score: prediction.score.clamp(0.0, 1.0),
        })
    }

    fn max_input_chars(&self) -> usize {
        MAX_INPUT_CHARS
    }
}

/// Funnels a raw model label into the closed label set. The label set is
/// validated at init time, so an unrecognized label here means the service
/// changed under us; degrade to Neutral rather than dropping the item.
fn normalize_label(raw: &str) -> SentimentLabel {
    SentimentLabel::from_model_label(raw).unwrap_or_else(|| {
        tracing::warn!(%raw, "unrecognized model label, mapping to Neutral");
        SentimentLabel::Neutral
    })
}

/// One-shot classifier construction: verify the service serves the
/// configured model, validate its label set against the pinned mapping,
/// then run a warmup inference so the service loads weights now instead of
/// on the first user request. Slow (seconds); run at most once per process
/// via [`crate::ClassifierCache`].
pub async fn init_classifier(
    config: &ClassifierConfig,
) -> Result<Arc<dyn Classifier>, ModelInitError> {
    let client = FinBertClient::new(config);

    let info = client
        .model_info()
        .await
        .map_err(|e| ModelInitError::Unavailable(e.to_string()))?;

    if info.model != config.model {
        return Err(ModelInitError::Unavailable(format!(
            "service serves '{}', expected '{}'",
            info.model, config.model
        )));
    }

    let mut got: Vec<String> = info.labels.iter().map(|l| l.to_ascii_lowercase()).collect();
    got.sort();
    let mut expected: Vec<String> = MODEL_LABELS.iter().map(|l| l.to_string()).collect();
    expected.sort();
    if got != expected {
        return Err(ModelInitError::LabelMismatch { expected, got });
    }

    client
        .predict(&["markets steady ahead of earnings".to_string()])
        .await
        .map_err(|e| ModelInitError::Unavailable(format!("warmup inference failed: {e}")))?;

    tracing::info!(model = %config.model, "sentiment classifier initialized");
    Ok(Arc::new(FinBertClassifier { client }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_map_through_the_pinned_table() {
        assert_eq!(normalize_label("positive"), SentimentLabel::Positive);
        assert_eq!(normalize_label("NEGATIVE"), SentimentLabel::Negative);
        assert_eq!(normalize_label("Neutral"), SentimentLabel::Neutral);
    }

    #[test]
    fn unrecognized_label_degrades_to_neutral() {
        assert_eq!(normalize_label("LABEL_0"), SentimentLabel::Neutral);
        assert_eq!(normalize_label("bullish"), SentimentLabel::Neutral);
        assert_eq!(normalize_label(""), SentimentLabel::Neutral);
    }
}
