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

use crate::common::dropout::Dropout;
use crate::roberta::RobertaConfig;
use std::borrow::Borrow;
use tch::nn::{embedding, EmbeddingConfig};
use tch::{nn, Kind, Tensor};

#[derive(Debug)]
/// # Embeddings layer for RoBERTa models
/// Sums word, position and token type embeddings, followed by layer normalization and dropout.
/// Positions are counted over non-padding tokens only, starting right after the padding index.
pub struct RobertaEmbeddings {
    word_embeddings: nn::Embedding,
    position_embeddings: nn::Embedding,
    token_type_embeddings: nn::Embedding,
    layer_norm: nn::LayerNorm,
    dropout: Dropout,
    padding_index: i64,
}

impl RobertaEmbeddings {
    /// Build a new `RobertaEmbeddings`
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the embeddings layer
    /// * `config` - `RobertaConfig` object defining the vocabulary and hidden sizes
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> RobertaEmbeddings
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let padding_index = config.pad_token_id();

        let embedding_config = EmbeddingConfig {
            padding_idx: padding_index,
            ..Default::default()
        };

        let word_embeddings: nn::Embedding = embedding(
            p / "word_embeddings",
            config.vocab_size,
            config.hidden_size,
            embedding_config,
        );

        let position_embeddings: nn::Embedding = embedding(
            p / "position_embeddings",
            config.max_position_embeddings,
            config.hidden_size,
            embedding_config,
        );

        let token_type_embeddings: nn::Embedding = embedding(
            p / "token_type_embeddings",
            config.type_vocab_size,
            config.hidden_size,
            Default::default(),
        );

        let layer_norm_config = nn::LayerNormConfig {
            eps: config.layer_norm_eps(),
            ..Default::default()
        };
        let layer_norm: nn::LayerNorm =
            nn::layer_norm(p / "LayerNorm", vec![config.hidden_size], layer_norm_config);
        let dropout: Dropout = Dropout::new(config.hidden_dropout_prob);
        RobertaEmbeddings {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
            dropout,
            padding_index,
        }
    }

    /// Position ids for a batch of token ids: padding tokens keep the padding index, the other
    /// tokens are numbered from `padding_index + 1` onwards.
    pub fn create_position_ids_from_input_ids(&self, input_ids: &Tensor) -> Tensor {
        let mask: Tensor = input_ids.ne(self.padding_index).to_kind(Kind::Int64);
        mask.cumsum(1, Kind::Int64) * mask + self.padding_index
    }

    /// Forward pass through the embedding layer.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Input tensor of shape (*batch size*, *sequence_length*)
    /// * `token_type_ids` - Optional segment ids of shape (*batch size*, *sequence_length*). If None set to 0.
    /// * `position_ids` - Optional position ids of shape (*batch size*, *sequence_length*). If None, derived from the padding in `input_ids`.
    /// * `train` - boolean flag to turn on/off the dropout layers in the model. Should be set to false for inference.
    ///
    /// # Returns
    ///
    /// * `embedded_output` - `Tensor` of shape (*batch size*, *sequence_length*, *hidden_size*)
    pub fn forward_t(
        &self,
        input_ids: &Tensor,
        token_type_ids: Option<&Tensor>,
        position_ids: Option<&Tensor>,
        train: bool,
    ) -> Tensor {
        let input_embeddings = input_ids.apply(&self.word_embeddings);

        let position_embeddings = match position_ids {
            Some(position_ids) => position_ids.apply(&self.position_embeddings),
            None => self
                .create_position_ids_from_input_ids(input_ids)
                .apply(&self.position_embeddings),
        };

        let token_type_embeddings = match token_type_ids {
            Some(token_type_ids) => token_type_ids.apply(&self.token_type_embeddings),
            None => input_ids
                .zeros_like()
                .apply(&self.token_type_embeddings),
        };

        let embeddings: Tensor = input_embeddings + position_embeddings + token_type_embeddings;
        embeddings
            .apply(&self.layer_norm)
            .apply_t(&self.dropout, train)
    }
}
