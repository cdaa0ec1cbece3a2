use crate::pipelines::sentiment::{Sentiment, SentimentPolarity, SentimentScores};
use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentimentResponse {
    /// Input text, echoed unchanged
    pub text: String,
    pub sentiment: SentimentPolarity,
    pub scores: SentimentScores,
}

impl SentimentResponse {
    pub fn new(text: String, sentiment: Sentiment) -> SentimentResponse {
        SentimentResponse {
            text,
            sentiment: sentiment.polarity,
            scores: sentiment.scores,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_layout() -> anyhow::Result<()> {
        let response = SentimentResponse::new(
            "I love this!".to_string(),
            Sentiment::from_probabilities(&[0.01, 0.02, 0.97])?,
        );
        assert_eq!(
            serde_json::to_value(&response)?,
            json!({
                "text": "I love this!",
                "sentiment": "Positive",
                "scores": {"Negative": 0.01, "Neutral": 0.02, "Positive": 0.97}
            })
        );
        Ok(())
    }

    #[test]
    fn extra_request_fields_are_ignored() -> anyhow::Result<()> {
        let input: TextInput = serde_json::from_value(json!({"text": "hi", "lang": "en"}))?;
        assert_eq!(input.text, "hi");
        assert!(serde_json::from_value::<TextInput>(json!({"text": 3})).is_err());
        Ok(())
    }
}
