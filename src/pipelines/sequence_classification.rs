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

//! # Sequence classification pipeline (e.g. Sentiment Analysis)
//! More generic sequence classification pipeline, works with RoBERTa checkpoints fine-tuned
//! for single-sentence classification. By default, the dependencies for this model will be
//! downloaded for the Twitter RoBERTa sentiment model (Negative / Neutral / Positive).
//! Customized models can be loaded by overwriting the resources in the configuration.
//! The dependencies will be downloaded to the user's cache directory, under `.sentiment-api`.
//!
//! ```no_run
//! use sentiment_api::pipelines::sequence_classification::SequenceClassificationModel;
//! # fn main() -> anyhow::Result<()> {
//! let sequence_classification_model = SequenceClassificationModel::new(Default::default())?;
//! let input = [
//!     "Probably my all-time favorite movie, a story of selflessness, sacrifice and dedication to a noble cause, but it's not preachy or boring.",
//!     "This film tried to be too many things all at once: stinging political satire, Hollywood blockbuster, sappy romantic comedy, family values promo...",
//! ];
//! let output = sequence_classification_model.predict(&input)?;
//! # Ok(())
//! # }
//! ```
//! (Example courtesy of [IMDb](http://www.imdb.com))
//!
//! Output: \
//! ```no_run
//! # use sentiment_api::pipelines::sequence_classification::Label;
//! let output = [
//!     Label {
//!         text: String::from("LABEL_2"),
//!         score: 0.9861,
//!         id: 2,
//!         sentence: 0,
//!     },
//!     Label {
//!         text: String::from("LABEL_0"),
//!         score: 0.8437,
//!         id: 0,
//!         sentence: 1,
//!     },
//! ]
//! # ;
//! ```

use crate::common::weights::load_weights;
use crate::resources::{LocalResource, ResourceProvider};
use crate::roberta::{RobertaConfig, RobertaForSequenceClassification};
use crate::{Config, SentimentError};
use log::{debug, info};
use rust_tokenizers::tokenizer::{RobertaTokenizer, Tokenizer, TruncationStrategy};
use rust_tokenizers::TokenizedInput;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tch::nn::VarStore;
use tch::{no_grad, Device, Kind, Tensor};

#[cfg(feature = "remote")]
use crate::{
    resources::RemoteResource,
    roberta::{
        RobertaConfigResources, RobertaMergesResources, RobertaModelResources,
        RobertaVocabResources,
    },
};

/// Maximum number of tokens per input, special tokens included.
pub const DEFAULT_MAX_LENGTH: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// # Label generated by a `SequenceClassificationModel`
pub struct Label {
    /// Label String representation
    pub text: String,
    /// Confidence score
    pub score: f64,
    /// Label ID
    pub id: i64,
    /// Sentence index
    #[serde(default)]
    pub sentence: usize,
}

/// # Configuration for SequenceClassificationModel
/// Contains information regarding the model to load and device to place the model on.
pub struct SequenceClassificationConfig {
    /// Model weights resource (default: pretrained Twitter RoBERTa sentiment model)
    pub model_resource: Box<dyn ResourceProvider>,
    /// Config resource (default: pretrained Twitter RoBERTa sentiment model)
    pub config_resource: Box<dyn ResourceProvider>,
    /// Vocab resource (default: pretrained Twitter RoBERTa sentiment model)
    pub vocab_resource: Box<dyn ResourceProvider>,
    /// Merges resource (default: pretrained Twitter RoBERTa sentiment model)
    pub merges_resource: Box<dyn ResourceProvider>,
    /// Automatically lower case all input upon tokenization (assumes a lower-cased model)
    pub lower_case: bool,
    /// Flag indicating if the tokenizer should add a white space before each tokenized input
    pub add_prefix_space: bool,
    /// Maximum sequence length after tokenization, longer inputs are truncated
    pub max_length: usize,
    /// Device to place the model on (default: CUDA/GPU when available)
    pub device: Device,
}

impl SequenceClassificationConfig {
    /// Instantiate a new sequence classification configuration.
    ///
    /// # Arguments
    ///
    /// * `model_resource` - The `ResourceProvider` pointing to the model weights (`rust_model.ot`, `model.safetensors` or `pytorch_model.bin`)
    /// * `config_resource` - The `ResourceProvider` pointing to the model configuration (e.g. `config.json`)
    /// * `vocab_resource` - The `ResourceProvider` pointing to the tokenizer's vocabulary (e.g. `vocab.json`)
    /// * `merges_resource` - The `ResourceProvider` pointing to the tokenizer's merge file (e.g. `merges.txt`)
    /// * `lower_case` - A `bool` indicating whether the tokenizer should lower case all input
    pub fn new<RM, RC, RV, RMe>(
        model_resource: RM,
        config_resource: RC,
        vocab_resource: RV,
        merges_resource: RMe,
        lower_case: bool,
    ) -> SequenceClassificationConfig
    where
        RM: ResourceProvider + 'static,
        RC: ResourceProvider + 'static,
        RV: ResourceProvider + 'static,
        RMe: ResourceProvider + 'static,
    {
        SequenceClassificationConfig {
            model_resource: Box::new(model_resource),
            config_resource: Box::new(config_resource),
            vocab_resource: Box::new(vocab_resource),
            merges_resource: Box::new(merges_resource),
            lower_case,
            add_prefix_space: false,
            max_length: DEFAULT_MAX_LENGTH,
            device: Device::cuda_if_available(),
        }
    }

    /// Configuration pointing at a local directory holding `config.json`, `vocab.json`,
    /// `merges.txt` and the weights, `rust_model.ot`, `model.safetensors` or `pytorch_model.bin`
    /// (first found in that order).
    pub fn from_directory<P: AsRef<Path>>(
        directory: P,
    ) -> Result<SequenceClassificationConfig, SentimentError> {
        let directory = directory.as_ref();
        let weights = ["rust_model.ot", "model.safetensors", "pytorch_model.bin"]
            .iter()
            .map(|name| directory.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                SentimentError::IOError(format!(
                    "no rust_model.ot, model.safetensors or pytorch_model.bin weights found in {}",
                    directory.display()
                ))
            })?;

        Ok(SequenceClassificationConfig::new(
            LocalResource::from(weights),
            LocalResource::from(directory.join("config.json")),
            LocalResource::from(directory.join("vocab.json")),
            LocalResource::from(directory.join("merges.txt")),
            false,
        ))
    }
}

#[cfg(feature = "remote")]
impl Default for SequenceClassificationConfig {
    /// Provides the Twitter RoBERTa sentiment model (Negative / Neutral / Positive, English)
    fn default() -> SequenceClassificationConfig {
        SequenceClassificationConfig::new(
            RemoteResource::from_pretrained(RobertaModelResources::TWITTER_ROBERTA_SENTIMENT),
            RemoteResource::from_pretrained(RobertaConfigResources::TWITTER_ROBERTA_SENTIMENT),
            RemoteResource::from_pretrained(RobertaVocabResources::TWITTER_ROBERTA_SENTIMENT),
            RemoteResource::from_pretrained(RobertaMergesResources::TWITTER_ROBERTA_SENTIMENT),
            false,
        )
    }
}

/// # SequenceClassificationModel for Classification (e.g. Sentiment Analysis)
pub struct SequenceClassificationModel {
    tokenizer: RobertaTokenizer,
    sequence_classifier: RobertaForSequenceClassification,
    label_mapping: HashMap<i64, String>,
    num_labels: i64,
    pad_token_id: i64,
    max_length: usize,
    var_store: VarStore,
}

impl SequenceClassificationModel {
    /// Build a new `SequenceClassificationModel`
    ///
    /// Resolves (and downloads if needed) every resource, builds the tokenizer and the model and
    /// loads the weights. Any failure is returned, no partially loaded model is ever produced.
    ///
    /// # Arguments
    ///
    /// * `config` - `SequenceClassificationConfig` object containing the resource references (model, vocabulary, configuration) and device placement (CPU/GPU)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use sentiment_api::pipelines::sequence_classification::SequenceClassificationModel;
    ///
    /// let model = SequenceClassificationModel::new(Default::default())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        config: SequenceClassificationConfig,
    ) -> Result<SequenceClassificationModel, SentimentError> {
        let config_path = config.config_resource.get_local_path()?;
        let vocab_path = config.vocab_resource.get_local_path()?;
        let merges_path = config.merges_resource.get_local_path()?;
        let weights_path = config.model_resource.get_local_path()?;
        debug!(
            "resolved model resources: config={}, vocab={}, merges={}, weights={}",
            config_path.display(),
            vocab_path.display(),
            merges_path.display(),
            weights_path.display()
        );

        let tokenizer = RobertaTokenizer::from_file(
            &vocab_path,
            &merges_path,
            config.lower_case,
            config.add_prefix_space,
        )?;

        let model_config = RobertaConfig::from_file(&config_path)?;
        let num_labels = model_config.get_num_labels()?;
        let label_mapping = match &model_config.id2label {
            Some(id2label) => id2label.clone(),
            None => (0..num_labels)
                .map(|id| (id, format!("LABEL_{id}")))
                .collect(),
        };

        let mut var_store = VarStore::new(config.device);
        let sequence_classifier =
            RobertaForSequenceClassification::new(var_store.root(), &model_config)?;
        load_weights(&mut var_store, &weights_path)?;
        info!(
            "loaded sequence classification model ({} labels) from {} on {:?}",
            num_labels,
            weights_path.display(),
            config.device
        );

        Ok(SequenceClassificationModel {
            tokenizer,
            sequence_classifier,
            label_mapping,
            num_labels,
            pad_token_id: model_config.pad_token_id(),
            max_length: config.max_length,
            var_store,
        })
    }

    /// Number of classes predicted by the classification head.
    pub fn num_labels(&self) -> i64 {
        self.num_labels
    }

    /// Tokenizes, truncates and pads a batch of texts.
    ///
    /// # Returns
    ///
    /// * `(input_ids, attention_mask)` - Tensors of shape (*batch size*, *longest sequence*) on the model device
    pub fn prepare_for_model(&self, inputs: &[&str]) -> (Tensor, Tensor) {
        let tokenized_input: Vec<TokenizedInput> = self.tokenizer.encode_list(
            inputs,
            self.max_length,
            &TruncationStrategy::LongestFirst,
            0,
        );
        let max_len = tokenized_input
            .iter()
            .map(|input| input.token_ids.len())
            .max()
            .unwrap_or(0);

        let (token_ids, masks): (Vec<Tensor>, Vec<Tensor>) = tokenized_input
            .iter()
            .map(|input| {
                let mut token_ids = input.token_ids.clone();
                let mut mask = vec![1i64; token_ids.len()];
                token_ids.resize(max_len, self.pad_token_id);
                mask.resize(max_len, 0);
                (Tensor::from_slice(&token_ids), Tensor::from_slice(&mask))
            })
            .unzip();

        let device = self.var_store.device();
        (
            Tensor::stack(token_ids.as_slice(), 0).to(device),
            Tensor::stack(masks.as_slice(), 0).to(device),
        )
    }

    /// Probability distribution over the labels for each input, in label index order.
    ///
    /// # Arguments
    ///
    /// * `inputs` - `&[&str]` Array of texts to classify.
    ///
    /// # Returns
    ///
    /// * `Vec<Vec<f64>>` one softmax distribution per input text
    pub fn predict_scores(&self, inputs: &[&str]) -> Result<Vec<Vec<f64>>, SentimentError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let (input_ids, attention_mask) = self.prepare_for_model(inputs);

        let probabilities = no_grad(|| -> Result<Tensor, SentimentError> {
            let output = self.sequence_classifier.forward_t(
                &input_ids,
                Some(&attention_mask),
                None,
                None,
                false,
            )?;
            Ok(output.logits.softmax(-1, Kind::Double).to(Device::Cpu))
        })?;

        (0..inputs.len() as i64)
            .map(|sentence_idx| {
                Vec::<f64>::try_from(&probabilities.get(sentence_idx)).map_err(Into::into)
            })
            .collect()
    }

    /// Classify texts
    ///
    /// # Arguments
    ///
    /// * `inputs` - `&[&str]` Array of texts to classify.
    ///
    /// # Returns
    ///
    /// * `Vec<Label>` containing the most likely label for each input text
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// # use sentiment_api::pipelines::sequence_classification::SequenceClassificationModel;
    ///
    /// let sequence_classification_model = SequenceClassificationModel::new(Default::default())?;
    /// let input = [
    ///     "Probably my all-time favorite movie, a story of selflessness, sacrifice and dedication to a noble cause, but it's not preachy or boring.",
    ///     "This film tried to be too many things all at once: stinging political satire, Hollywood blockbuster, sappy romantic comedy, family values promo...",
    /// ];
    /// let output = sequence_classification_model.predict(&input)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, inputs: &[&str]) -> Result<Vec<Label>, SentimentError> {
        let scores = self.predict_scores(inputs)?;
        scores
            .iter()
            .enumerate()
            .map(|(sentence_idx, distribution)| {
                let id = first_argmax(distribution).ok_or_else(|| {
                    SentimentError::ValueError("empty score distribution".to_string())
                })?;
                let id = id as i64;
                let text = self
                    .label_mapping
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("LABEL_{id}"));
                Ok(Label {
                    text,
                    score: distribution[id as usize],
                    id,
                    sentence: sentence_idx,
                })
            })
            .collect()
    }
}

/// Index of the largest value. Ties resolve to the lowest index.
pub fn first_argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, &value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((idx, value)),
        })
        .map(|(idx, _)| idx)
}
