// Copyright 2019-present, the HuggingFace Inc. team, The Google AI Language Team and Facebook, Inc.
// Copyright (c) 2018, NVIDIA CORPORATION.  All rights reserved.
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

use crate::common::activations::Activation;
use crate::common::dropout::Dropout;
use crate::roberta::embeddings::RobertaEmbeddings;
use crate::roberta::encoder::RobertaEncoder;
use crate::{Config, SentimentError};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use tch::{nn, Tensor};

/// # RoBERTa Pretrained model weight files
pub struct RobertaModelResources;

/// # RoBERTa Pretrained model config files
pub struct RobertaConfigResources;

/// # RoBERTa Pretrained model vocab files
pub struct RobertaVocabResources;

/// # RoBERTa Pretrained model merges files
pub struct RobertaMergesResources;

impl RobertaModelResources {
    /// Shared under MIT license by the Cardiff NLP team at <https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment>.
    pub const TWITTER_ROBERTA_SENTIMENT: (&'static str, &'static str) = (
        "twitter-roberta-base-sentiment/model",
        "https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment/resolve/main/pytorch_model.bin",
    );
}

impl RobertaConfigResources {
    /// Shared under MIT license by the Cardiff NLP team at <https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment>.
    pub const TWITTER_ROBERTA_SENTIMENT: (&'static str, &'static str) = (
        "twitter-roberta-base-sentiment/config",
        "https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment/resolve/main/config.json",
    );
}

impl RobertaVocabResources {
    /// Shared under MIT license by the Cardiff NLP team at <https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment>.
    pub const TWITTER_ROBERTA_SENTIMENT: (&'static str, &'static str) = (
        "twitter-roberta-base-sentiment/vocab",
        "https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment/resolve/main/vocab.json",
    );
}

impl RobertaMergesResources {
    /// Shared under MIT license by the Cardiff NLP team at <https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment>.
    pub const TWITTER_ROBERTA_SENTIMENT: (&'static str, &'static str) = (
        "twitter-roberta-base-sentiment/merges",
        "https://huggingface.co/cardiffnlp/twitter-roberta-base-sentiment/resolve/main/merges.txt",
    );
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// # RoBERTa model configuration
/// Defines the RoBERTa model architecture (e.g. number of layers, hidden layer size, label mapping...).
/// Deserializes from the `config.json` shipped with Transformers checkpoints.
pub struct RobertaConfig {
    pub hidden_act: Activation,
    pub attention_probs_dropout_prob: f64,
    pub hidden_dropout_prob: f64,
    pub hidden_size: i64,
    pub initializer_range: Option<f64>,
    pub intermediate_size: i64,
    pub max_position_embeddings: i64,
    pub num_attention_heads: i64,
    pub num_hidden_layers: i64,
    pub type_vocab_size: i64,
    pub vocab_size: i64,
    pub layer_norm_eps: Option<f64>,
    pub pad_token_id: Option<i64>,
    pub output_attentions: Option<bool>,
    pub output_hidden_states: Option<bool>,
    pub id2label: Option<HashMap<i64, String>>,
    pub label2id: Option<HashMap<String, i64>>,
    pub num_labels: Option<i64>,
}

impl Config for RobertaConfig {}

impl Default for RobertaConfig {
    fn default() -> Self {
        RobertaConfig {
            hidden_act: Activation::gelu,
            attention_probs_dropout_prob: 0.1,
            hidden_dropout_prob: 0.1,
            hidden_size: 768,
            initializer_range: Some(0.02),
            intermediate_size: 3072,
            max_position_embeddings: 514,
            num_attention_heads: 12,
            num_hidden_layers: 12,
            type_vocab_size: 1,
            vocab_size: 50265,
            layer_norm_eps: Some(1e-5),
            pad_token_id: Some(1),
            output_attentions: None,
            output_hidden_states: None,
            id2label: None,
            label2id: None,
            num_labels: None,
        }
    }
}

impl RobertaConfig {
    pub fn layer_norm_eps(&self) -> f64 {
        self.layer_norm_eps.unwrap_or(1e-5)
    }

    pub fn pad_token_id(&self) -> i64 {
        self.pad_token_id.unwrap_or(1)
    }

    /// Number of classes of the classification head. Read from `id2label` first, as the
    /// Transformers library does, then from the explicit `num_labels` field.
    pub fn get_num_labels(&self) -> Result<i64, SentimentError> {
        match (&self.id2label, self.num_labels) {
            (Some(id2label), _) if !id2label.is_empty() => Ok(id2label.len() as i64),
            (_, Some(num_labels)) if num_labels > 0 => Ok(num_labels),
            _ => Err(SentimentError::InvalidConfigurationError(
                "num_labels not provided in configuration".to_string(),
            )),
        }
    }
}

/// # RoBERTa Base model
/// It is made of the following blocks:
/// - `embeddings`: `token`, `position` and `segment_id` embeddings
/// - `encoder`: Encoder (transformer) made of a vector of layers. Each layer is made of a self-attention layer, an intermediate (linear) and output (linear + layer norm) layers
///
/// The checkpoints served by this crate do not use the pooling layer, it is therefore not built.
pub struct RobertaModel {
    embeddings: RobertaEmbeddings,
    encoder: RobertaEncoder,
}

impl RobertaModel {
    /// Build a new `RobertaModel`
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the RoBERTa model
    /// * `config` - `RobertaConfig` object defining the model architecture
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> Result<RobertaModel, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let embeddings = RobertaEmbeddings::new(p / "embeddings", config);
        let encoder = RobertaEncoder::new(p / "encoder", config)?;

        Ok(RobertaModel {
            embeddings,
            encoder,
        })
    }

    /// Forward pass through the model
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Input tensor of shape (*batch size*, *sequence_length*)
    /// * `mask` - Optional mask of shape (*batch size*, *sequence_length*). Masked position have value 0, non-masked value 1. If None set to 1
    /// * `token_type_ids` - Optional segment id of shape (*batch size*, *sequence_length*). If None set to 0.
    /// * `position_ids` - Optional position ids of shape (*batch size*, *sequence_length*). If None, derived from the padding in `input_ids`.
    /// * `train` - boolean flag to turn on/off the dropout layers in the model. Should be set to false for inference.
    ///
    /// # Returns
    ///
    /// * `RobertaModelOutput` containing:
    ///   - `hidden_state` - `Tensor` of shape (*batch size*, *sequence_length*, *hidden_size*)
    ///   - `all_hidden_states` - `Option<Vec<Tensor>>` of length *num_hidden_layers* with shape (*batch size*, *sequence_length*, *hidden_size*)
    ///   - `all_attentions` - `Option<Vec<Tensor>>` of length *num_hidden_layers* with shape (*batch size*, *heads*, *sequence_length*, *sequence_length*)
    pub fn forward_t(
        &self,
        input_ids: &Tensor,
        mask: Option<&Tensor>,
        token_type_ids: Option<&Tensor>,
        position_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<RobertaModelOutput, SentimentError> {
        let extended_attention_mask = match mask {
            Some(mask) => match mask.dim() {
                3 => mask.unsqueeze(1),
                2 => mask.unsqueeze(1).unsqueeze(1),
                _ => {
                    return Err(SentimentError::ValueError(
                        "Invalid attention mask dimension, must be 2 or 3".into(),
                    ));
                }
            },
            None => input_ids.ones_like().unsqueeze(1).unsqueeze(1),
        };

        let embedding_output =
            self.embeddings
                .forward_t(input_ids, token_type_ids, position_ids, train);

        let extended_attention_mask: Tensor =
            ((extended_attention_mask.ones_like() - extended_attention_mask) * -10000.0)
                .to_kind(embedding_output.kind());

        let encoder_output =
            self.encoder
                .forward_t(&embedding_output, Some(&extended_attention_mask), train);

        Ok(RobertaModelOutput {
            hidden_state: encoder_output.hidden_state,
            all_hidden_states: encoder_output.all_hidden_states,
            all_attentions: encoder_output.all_attentions,
        })
    }
}

/// Classification head applied to the representation of the first (`<s>`) token.
pub struct RobertaClassificationHead {
    dense: nn::Linear,
    dropout: Dropout,
    out_proj: nn::Linear,
}

impl RobertaClassificationHead {
    pub fn new<'p, P>(
        p: P,
        config: &RobertaConfig,
    ) -> Result<RobertaClassificationHead, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let dense = nn::linear(
            p / "dense",
            config.hidden_size,
            config.hidden_size,
            Default::default(),
        );
        let out_proj = nn::linear(
            p / "out_proj",
            config.hidden_size,
            config.get_num_labels()?,
            Default::default(),
        );
        let dropout = Dropout::new(config.hidden_dropout_prob);

        Ok(RobertaClassificationHead {
            dense,
            dropout,
            out_proj,
        })
    }

    pub fn forward_t(&self, hidden_states: &Tensor, train: bool) -> Tensor {
        hidden_states
            .select(1, 0)
            .apply_t(&self.dropout, train)
            .apply(&self.dense)
            .tanh()
            .apply_t(&self.dropout, train)
            .apply(&self.out_proj)
    }
}

/// # RoBERTa for sequence classification
/// Base RoBERTa model with a classifier head to perform sentence or document-level classification
/// It is made of the following blocks:
/// - `roberta`: Base RoBERTa model
/// - `classifier`: RoBERTa classification head made of 2 linear layers
pub struct RobertaForSequenceClassification {
    roberta: RobertaModel,
    classifier: RobertaClassificationHead,
}

impl RobertaForSequenceClassification {
    /// Build a new `RobertaForSequenceClassification`
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the model
    /// * `config` - `RobertaConfig` object defining the model architecture and number of labels
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sentiment_api::roberta::{RobertaConfig, RobertaForSequenceClassification};
    /// use sentiment_api::Config;
    /// use std::path::Path;
    /// use tch::{nn, Device};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config_path = Path::new("path/to/config.json");
    /// let device = Device::Cpu;
    /// let p = nn::VarStore::new(device);
    /// let config = RobertaConfig::from_file(config_path)?;
    /// let roberta = RobertaForSequenceClassification::new(p.root(), &config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<'p, P>(
        p: P,
        config: &RobertaConfig,
    ) -> Result<RobertaForSequenceClassification, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let roberta = RobertaModel::new(p / "roberta", config)?;
        let classifier = RobertaClassificationHead::new(p / "classifier", config)?;

        Ok(RobertaForSequenceClassification {
            roberta,
            classifier,
        })
    }

    /// Forward pass through the model
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Input tensor of shape (*batch size*, *sequence_length*)
    /// * `mask` - Optional mask of shape (*batch size*, *sequence_length*). Masked position have value 0, non-masked value 1. If None set to 1
    /// * `token_type_ids` - Optional segment id of shape (*batch size*, *sequence_length*). If None set to 0.
    /// * `position_ids` - Optional position ids of shape (*batch size*, *sequence_length*). If None, derived from the padding in `input_ids`.
    /// * `train` - boolean flag to turn on/off the dropout layers in the model. Should be set to false for inference.
    ///
    /// # Returns
    ///
    /// * `RobertaSequenceClassificationOutput` containing:
    ///   - `logits` - `Tensor` of shape (*batch size*, *num_labels*)
    ///   - `all_hidden_states` - `Option<Vec<Tensor>>` of length *num_hidden_layers* with shape (*batch size*, *sequence_length*, *hidden_size*)
    ///   - `all_attentions` - `Option<Vec<Tensor>>` of length *num_hidden_layers* with shape (*batch size*, *heads*, *sequence_length*, *sequence_length*)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use sentiment_api::roberta::{RobertaConfig, RobertaForSequenceClassification};
    /// # use tch::{nn, Device, Tensor, no_grad, Kind};
    /// # use sentiment_api::Config;
    /// # use std::path::Path;
    /// # fn main() -> anyhow::Result<()> {
    /// # let config_path = Path::new("path/to/config.json");
    /// # let device = Device::Cpu;
    /// # let vs = nn::VarStore::new(device);
    /// # let config = RobertaConfig::from_file(config_path)?;
    /// # let roberta_model = RobertaForSequenceClassification::new(vs.root(), &config)?;
    /// let (batch_size, sequence_length) = (64, 128);
    /// let input_tensor = Tensor::ones(&[batch_size, sequence_length], (Kind::Int64, device));
    /// let mask = Tensor::ones(&[batch_size, sequence_length], (Kind::Int64, device));
    ///
    /// let model_output =
    ///     no_grad(|| roberta_model.forward_t(&input_tensor, Some(&mask), None, None, false))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn forward_t(
        &self,
        input_ids: &Tensor,
        mask: Option<&Tensor>,
        token_type_ids: Option<&Tensor>,
        position_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<RobertaSequenceClassificationOutput, SentimentError> {
        let base_model_output =
            self.roberta
                .forward_t(input_ids, mask, token_type_ids, position_ids, train)?;

        let logits = self
            .classifier
            .forward_t(&base_model_output.hidden_state, train);
        Ok(RobertaSequenceClassificationOutput {
            logits,
            all_hidden_states: base_model_output.all_hidden_states,
            all_attentions: base_model_output.all_attentions,
        })
    }
}

/// Container for the RoBERTa base model output.
pub struct RobertaModelOutput {
    /// Last hidden states from the model
    pub hidden_state: Tensor,
    /// Hidden states for all intermediate layers
    pub all_hidden_states: Option<Vec<Tensor>>,
    /// Attention weights for all intermediate layers
    pub all_attentions: Option<Vec<Tensor>>,
}

/// Container for the RoBERTa sequence classification model output.
pub struct RobertaSequenceClassificationOutput {
    /// Logits for each input (sequence) for each target class
    pub logits: Tensor,
    /// Hidden states for all intermediate layers
    pub all_hidden_states: Option<Vec<Tensor>>,
    /// Attention weights for all intermediate layers
    pub all_attentions: Option<Vec<Tensor>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tch::{no_grad, Device, Kind};

    fn tiny_config() -> RobertaConfig {
        RobertaConfig {
            hidden_size: 8,
            intermediate_size: 16,
            num_attention_heads: 2,
            num_hidden_layers: 2,
            vocab_size: 32,
            max_position_embeddings: 40,
            output_attentions: Some(true),
            output_hidden_states: Some(true),
            num_labels: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn transformers_config_file_is_parsed() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{
                "architectures": ["RobertaForSequenceClassification"],
                "attention_probs_dropout_prob": 0.1,
                "bos_token_id": 0,
                "eos_token_id": 2,
                "hidden_act": "gelu",
                "hidden_dropout_prob": 0.1,
                "hidden_size": 768,
                "id2label": {{"0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2"}},
                "initializer_range": 0.02,
                "intermediate_size": 3072,
                "label2id": {{"LABEL_0": 0, "LABEL_1": 1, "LABEL_2": 2}},
                "layer_norm_eps": 1e-05,
                "max_position_embeddings": 514,
                "model_type": "roberta",
                "num_attention_heads": 12,
                "num_hidden_layers": 12,
                "pad_token_id": 1,
                "type_vocab_size": 1,
                "vocab_size": 50265
            }}"#
        )?;

        let config = RobertaConfig::from_file(file.path())?;
        assert_eq!(config.get_num_labels()?, 3);
        assert_eq!(config.id2label.as_ref().unwrap()[&2i64], "LABEL_2");
        assert_eq!(config.pad_token_id(), 1);
        assert!((config.layer_norm_eps() - 1e-5).abs() < 1e-12);
        assert_eq!(config.hidden_act, Activation::gelu);
        Ok(())
    }

    #[test]
    fn missing_labels_are_rejected() {
        let config = RobertaConfig::default();
        assert!(matches!(
            config.get_num_labels(),
            Err(SentimentError::InvalidConfigurationError(_))
        ));

        let vs = nn::VarStore::new(Device::Cpu);
        assert!(RobertaForSequenceClassification::new(vs.root(), &config).is_err());
    }

    #[test]
    fn incompatible_head_count_is_rejected() {
        let config = RobertaConfig {
            num_attention_heads: 3,
            ..tiny_config()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        assert!(RobertaForSequenceClassification::new(vs.root(), &config).is_err());
    }

    #[test]
    fn sequence_classification_output_shapes() -> anyhow::Result<()> {
        let config = tiny_config();
        let vs = nn::VarStore::new(Device::Cpu);
        let model = RobertaForSequenceClassification::new(vs.root(), &config)?;

        let input_ids = Tensor::from_slice(&[0i64, 7, 9, 2, 0, 4, 2, 1]).view((2, 4));
        let mask = input_ids.ne(1).to_kind(Kind::Int64);
        let output = no_grad(|| model.forward_t(&input_ids, Some(&mask), None, None, false))?;

        assert_eq!(output.logits.size(), vec![2, 3]);
        assert_eq!(output.all_hidden_states.map(|h| h.len()), Some(2));
        let attentions = output.all_attentions.unwrap();
        assert_eq!(attentions.len(), 2);
        assert_eq!(attentions[0].size(), vec![2, 2, 4, 4]);
        Ok(())
    }

    #[test]
    fn inference_is_deterministic() -> anyhow::Result<()> {
        let config = tiny_config();
        let vs = nn::VarStore::new(Device::Cpu);
        let model = RobertaForSequenceClassification::new(vs.root(), &config)?;
        let input_ids = Tensor::from_slice(&[0i64, 11, 12, 13, 2]).unsqueeze(0);

        let first = no_grad(|| model.forward_t(&input_ids, None, None, None, false))?.logits;
        let second = no_grad(|| model.forward_t(&input_ids, None, None, None, false))?.logits;
        for label in 0..3 {
            assert_eq!(
                first.double_value(&[0, label]),
                second.double_value(&[0, label])
            );
        }
        Ok(())
    }

    #[test]
    fn invalid_mask_rank_is_an_error() -> anyhow::Result<()> {
        let config = tiny_config();
        let vs = nn::VarStore::new(Device::Cpu);
        let model = RobertaForSequenceClassification::new(vs.root(), &config)?;
        let input_ids = Tensor::from_slice(&[0i64, 5, 2]).unsqueeze(0);
        let mask = Tensor::ones(&[1, 1, 1, 3], (Kind::Int64, Device::Cpu));

        let output = no_grad(|| model.forward_t(&input_ids, Some(&mask), None, None, false));
        assert!(matches!(output, Err(SentimentError::ValueError(_))));
        Ok(())
    }
}
