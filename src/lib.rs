//! # Sentiment analysis over HTTP with a Rust RoBERTa implementation
//!
//! Three-way sentiment classification (Negative / Neutral / Positive) served over HTTP.
//! The classifier is a port of the RoBERTa encoder on top of `tch-rs` (libtorch bindings)
//! with a sequence classification head, and byte-level BPE tokenization from `rust_tokenizers`.
//! By default the Twitter RoBERTa sentiment checkpoint is downloaded and cached on first use.
//!
//! The crate is organized in layers:
//! - `roberta`: model architecture and pretrained resource identifiers
//! - `pipelines`: tokenization, batching, inference and post-processing
//!   (`pipelines::sequence_classification`, `pipelines::sentiment`)
//! - `server`: the actix-web service exposing `POST /analyze`
//!
//! ```no_run
//! use sentiment_api::pipelines::sentiment::SentimentModel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let sentiment_model = SentimentModel::new(Default::default())?;
//! let output = sentiment_model.predict(&["I love this!"])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading the model from a local directory
//!
//! A directory holding `config.json`, `vocab.json`, `merges.txt` and the weights
//! (`rust_model.ot` converted with the libtorch utilities, or `model.safetensors`) can be used
//! instead of the remote resources:
//!
//! ```no_run
//! use sentiment_api::pipelines::sentiment::{SentimentConfig, SentimentModel};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SentimentConfig::from_directory("path/to/twitter-roberta-base-sentiment")?;
//! let sentiment_model = SentimentModel::new(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `remote` (default): download resources with `cached-path` into `<cache dir>/.sentiment-api`
//! - `default-tls` (default) / `rustls-tls`: TLS backend used for downloads
//! - `all-tests`: run the tests that need to download the pretrained checkpoint
//! - `doc-only`: build documentation without a libtorch installation

pub mod common;
pub mod pipelines;
pub mod roberta;
pub mod server;

pub use common::error::SentimentError;
pub use common::resources;
pub use common::{load_weights, Activation, Config};
