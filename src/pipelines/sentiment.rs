// Copyright 2019-present, the HuggingFace Inc. team, The Google AI Language Team and Facebook, Inc.
// Copyright 2019 Guillaume Becquin
// Copyright 2024 The sentiment-api authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Sentiment Analysis pipeline
//! Predicts a three-way sentiment (Negative / Neutral / Positive) for a sentence, with the full
//! probability distribution. By default, the dependencies for this model will be downloaded for
//! the Twitter RoBERTa model fine-tuned on the TweetEval sentiment task.
//! The dependencies will be downloaded to the user's cache directory, under `.sentiment-api/twitter-roberta-base-sentiment`
//!
//! ```no_run
//! use sentiment_api::pipelines::sentiment::SentimentModel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let sentiment_classifier = SentimentModel::new(Default::default())?;
//! let input = ["I love this!", "The service was slow and the food was cold."];
//! let output = sentiment_classifier.predict(&input)?;
//! # Ok(())
//! # }
//! ```
//!
//! Output: \
//! ```no_run
//! # use sentiment_api::pipelines::sentiment::{Sentiment, SentimentScores};
//! # use sentiment_api::pipelines::sentiment::SentimentPolarity::{Positive, Negative};
//! # let output =
//! [
//!     Sentiment {
//!         polarity: Positive,
//!         scores: SentimentScores {
//!             negative: 0.0048,
//!             neutral: 0.0152,
//!             positive: 0.98,
//!         },
//!     },
//!     Sentiment {
//!         polarity: Negative,
//!         scores: SentimentScores {
//!             negative: 0.9385,
//!             neutral: 0.0557,
//!             positive: 0.0058,
//!         },
//!     },
//! ]
//! # ;
//! ```

use crate::pipelines::sequence_classification::{
    first_argmax, SequenceClassificationConfig, SequenceClassificationModel,
};
use crate::SentimentError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Enum with the possible sentiment polarities, in the label order of the classification head.
pub enum SentimentPolarity {
    Negative,
    Neutral,
    Positive,
}

impl SentimentPolarity {
    /// All polarities, indexed by class id.
    pub const ALL: [SentimentPolarity; 3] = [
        SentimentPolarity::Negative,
        SentimentPolarity::Neutral,
        SentimentPolarity::Positive,
    ];

    pub fn from_index(index: usize) -> Option<SentimentPolarity> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentPolarity::Negative => "Negative",
            SentimentPolarity::Neutral => "Neutral",
            SentimentPolarity::Positive => "Positive",
        }
    }
}

impl fmt::Display for SentimentPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Probability of each polarity, rounded to 4 decimal places.
pub struct SentimentScores {
    #[serde(rename = "Negative")]
    pub negative: f64,
    #[serde(rename = "Neutral")]
    pub neutral: f64,
    #[serde(rename = "Positive")]
    pub positive: f64,
}

impl SentimentScores {
    pub fn get(&self, polarity: SentimentPolarity) -> f64 {
        match polarity {
            SentimentPolarity::Negative => self.negative,
            SentimentPolarity::Neutral => self.neutral,
            SentimentPolarity::Positive => self.positive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Sentiment returned by the model.
pub struct Sentiment {
    /// Polarity of the sentiment
    pub polarity: SentimentPolarity,
    /// Rounded probability of each polarity
    pub scores: SentimentScores,
}

impl Sentiment {
    /// Builds a `Sentiment` from an unrounded probability distribution in class order.
    /// The polarity is selected before rounding, ties resolve to the lowest class index.
    pub fn from_probabilities(probabilities: &[f64]) -> Result<Sentiment, SentimentError> {
        if probabilities.len() != SentimentPolarity::ALL.len() {
            return Err(SentimentError::ValueError(format!(
                "expected {} class probabilities, got {}",
                SentimentPolarity::ALL.len(),
                probabilities.len()
            )));
        }
        let polarity = first_argmax(probabilities)
            .and_then(SentimentPolarity::from_index)
            .ok_or_else(|| SentimentError::ValueError("invalid score distribution".into()))?;

        Ok(Sentiment {
            polarity,
            scores: SentimentScores {
                negative: round_score(probabilities[0]),
                neutral: round_score(probabilities[1]),
                positive: round_score(probabilities[2]),
            },
        })
    }
}

/// Rounds a probability to 4 decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

pub type SentimentConfig = SequenceClassificationConfig;

/// # SentimentClassifier to perform sentiment analysis
pub struct SentimentModel {
    sequence_classification_model: SequenceClassificationModel,
}

impl SentimentModel {
    /// Build a new `SentimentModel`
    ///
    /// # Arguments
    ///
    /// * `sentiment_config` - `SentimentConfig` object containing the resource references (model, vocabulary, configuration) and device placement (CPU/GPU)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use sentiment_api::pipelines::sentiment::SentimentModel;
    ///
    /// let sentiment_model = SentimentModel::new(Default::default())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(sentiment_config: SentimentConfig) -> Result<SentimentModel, SentimentError> {
        let sequence_classification_model = SequenceClassificationModel::new(sentiment_config)?;
        let num_labels = sequence_classification_model.num_labels();
        if num_labels != SentimentPolarity::ALL.len() as i64 {
            return Err(SentimentError::InvalidConfigurationError(format!(
                "sentiment model must have 3 labels (Negative, Neutral, Positive), found {num_labels}"
            )));
        }
        Ok(SentimentModel {
            sequence_classification_model,
        })
    }

    /// Extract sentiment form an array of text inputs
    ///
    /// # Arguments
    ///
    /// * `input` - `&[&str]` Array of texts to extract the sentiment from.
    ///
    /// # Returns
    /// * `Vec<Sentiment>` Sentiments extracted from texts.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use sentiment_api::pipelines::sentiment::SentimentModel;
    ///
    /// let sentiment_classifier = SentimentModel::new(Default::default())?;
    ///
    /// let input = [
    ///     "Probably my all-time favorite movie, a story of selflessness, sacrifice and dedication to a noble cause, but it's not preachy or boring.",
    ///     "This film tried to be too many things all at once: stinging political satire, Hollywood blockbuster, sappy romantic comedy, family values promo...",
    /// ];
    ///
    /// let output = sentiment_classifier.predict(&input)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, input: &[&str]) -> Result<Vec<Sentiment>, SentimentError> {
        self.sequence_classification_model
            .predict_scores(input)?
            .iter()
            .map(|probabilities| Sentiment::from_probabilities(probabilities))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scores_are_rounded_to_four_decimals() {
        assert_eq!(round_score(0.123_456), 0.1235);
        assert_eq!(round_score(0.987_64), 0.9876);
        assert_eq!(round_score(1.0), 1.0);
        assert_eq!(round_score(0.0), 0.0);
    }

    #[test]
    fn polarity_follows_class_index() {
        assert_eq!(
            SentimentPolarity::from_index(0),
            Some(SentimentPolarity::Negative)
        );
        assert_eq!(
            SentimentPolarity::from_index(2),
            Some(SentimentPolarity::Positive)
        );
        assert_eq!(SentimentPolarity::from_index(3), None);
        assert_eq!(SentimentPolarity::Neutral.to_string(), "Neutral");
    }

    #[test]
    fn sentiment_from_probabilities() -> anyhow::Result<()> {
        let sentiment = Sentiment::from_probabilities(&[0.004_81, 0.015_23, 0.979_96])?;
        assert_eq!(sentiment.polarity, SentimentPolarity::Positive);
        assert_eq!(sentiment.scores.negative, 0.0048);
        assert_eq!(sentiment.scores.neutral, 0.0152);
        assert_eq!(sentiment.scores.positive, 0.98);
        assert_eq!(
            sentiment.scores.get(sentiment.polarity),
            sentiment.scores.positive
        );
        Ok(())
    }

    #[test]
    fn tie_resolves_to_lowest_class() -> anyhow::Result<()> {
        let sentiment = Sentiment::from_probabilities(&[0.2, 0.4, 0.4])?;
        assert_eq!(sentiment.polarity, SentimentPolarity::Neutral);
        Ok(())
    }

    #[test]
    fn polarity_is_chosen_before_rounding() -> anyhow::Result<()> {
        let sentiment = Sentiment::from_probabilities(&[0.333_31, 0.333_34, 0.333_00])?;
        assert_eq!(sentiment.polarity, SentimentPolarity::Neutral);
        assert_eq!(sentiment.scores.negative, sentiment.scores.neutral);
        Ok(())
    }

    #[test]
    fn wrong_number_of_classes_is_an_error() {
        assert!(matches!(
            Sentiment::from_probabilities(&[0.5, 0.5]),
            Err(SentimentError::ValueError(_))
        ));
    }

    #[test]
    fn scores_serialize_with_label_keys() -> anyhow::Result<()> {
        let scores = SentimentScores {
            negative: 0.1,
            neutral: 0.2,
            positive: 0.7,
        };
        let value = serde_json::to_value(scores)?;
        assert_eq!(
            value,
            serde_json::json!({"Negative": 0.1, "Neutral": 0.2, "Positive": 0.7})
        );
        assert_eq!(
            serde_json::to_value(SentimentPolarity::Positive)?,
            serde_json::json!("Positive")
        );
        Ok(())
    }

    #[test]
    #[ignore] // no need to run, compilation is enough to verify it is Send and Sync
    fn test() {
        let config = SentimentConfig::from_directory("path/to/model");
        let _: Box<dyn Send + Sync> = Box::new(config.and_then(SentimentModel::new));
    }
}
