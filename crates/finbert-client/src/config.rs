use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8003";
const DEFAULT_MODEL: &str = "ProsusAI/finbert";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the sentiment inference service. `model` is the single
/// option that selects the classifier version; swapping it requires no code
/// change as long as the new model serves the same label set.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub prewarm: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            prewarm: false,
        }
    }
}

impl ClassifierConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SENTIMENT_API_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("SENTIMENT_MODEL") {
            config.model = model;
        }
        if let Some(secs) = std::env::var("SENTIMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config.prewarm = std::env::var("SENTIMENT_PREWARM")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        config
    }
}
