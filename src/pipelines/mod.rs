//! # Ready-to-use NLP pipelines and models
//!
//! End-to-end pipelines built on top of the RoBERTa implementation of this crate:
//!
//! #### 1. Sequence classification
//! Tokenization, truncation to the model maximum length, padding, forward pass and softmax over
//! the classification head logits. Works with any RoBERTa checkpoint fine-tuned for single
//! sentence classification (`sequence_classification::SequenceClassificationModel`).
//!
//! #### 2. Sentiment analysis
//! Three-way sentiment classification (Negative / Neutral / Positive) with the rounded
//! probability of each class, using the Twitter RoBERTa sentiment checkpoint by default.
//!
//! ```no_run
//! use sentiment_api::pipelines::sentiment::SentimentModel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let sentiment_model = SentimentModel::new(Default::default())?;
//! let input = ["I love this!"];
//! let output = sentiment_model.predict(&input)?;
//! # Ok(())
//! # }
//! ```
//!
//! Output: \
//! `[Sentiment { polarity: Positive, scores: SentimentScores { negative: 0.0048, neutral: 0.0152, positive: 0.98 } }]`

pub mod sentiment;
pub mod sequence_classification;
