use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use sentiment_core::{Classifier, ClassifierProvider, ModelInitError};
use tokio::sync::OnceCell;

use crate::classifier::init_classifier;
use crate::config::ClassifierConfig;

/// Process-wide lazy guard around classifier construction. Concurrent
/// first callers block on a single in-flight initialization and then share
/// one handle. The stored value is the `Result` of that one attempt, so a
/// failed init fails fast for the rest of the process lifetime instead of
/// re-running the expensive construction.
pub struct ClassifierCache {
    config: ClassifierConfig,
    cell: OnceCell<Result<Arc<dyn Classifier>, ModelInitError>>,
}

impl ClassifierCache {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ClassifierConfig::from_env())
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Get the shared classifier handle, constructing it on first call.
    pub async fn get(&self) -> Result<Arc<dyn Classifier>, ModelInitError> {
        self.get_or_init_with(|| init_classifier(&self.config)).await
    }

    /// Same as [`get`](Self::get) with an injected initializer. The
    /// initializer runs at most once per cache, no matter how many callers
    /// race here.
    pub async fn get_or_init_with<F, Fut>(
        &self,
        init: F,
    ) -> Result<Arc<dyn Classifier>, ModelInitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn Classifier>, ModelInitError>>,
    {
        self.cell.get_or_init(init).await.clone()
    }

    /// Eagerly initialize at process start, trading startup delay for
    /// first-request latency.
    pub async fn warm(&self) -> Result<(), ModelInitError> {
        self.get().await.map(|_| ())
    }

    pub fn initialized(&self) -> bool {
        self.cell.initialized()
    }
}

#[async_trait]
impl ClassifierProvider for ClassifierCache {
    async fn classifier(&self) -> Result<Arc<dyn Classifier>, ModelInitError> {
        self.get().await
    }
}
