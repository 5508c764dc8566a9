pub mod cache;
pub mod classifier;
pub mod client;
pub mod config;

pub use cache::ClassifierCache;
pub use classifier::{init_classifier, FinBertClassifier, MAX_INPUT_CHARS};
pub use client::{FinBertClient, ModelInfo, PredictResponse, Prediction, ServiceError};
pub use config::ClassifierConfig;
