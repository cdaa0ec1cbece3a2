use crate::pipelines::sentiment::{Sentiment, SentimentModel};
use crate::SentimentError;
use std::sync::Arc;

/// Single-text sentiment classification, shared read-only by every HTTP worker.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Sentiment, SentimentError>;
}

impl Classifier for SentimentModel {
    fn classify(&self, text: &str) -> Result<Sentiment, SentimentError> {
        self.predict(&[text])?
            .pop()
            .ok_or_else(|| SentimentError::ValueError("model returned no prediction".to_string()))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>) -> AppState {
        AppState { classifier }
    }
}
