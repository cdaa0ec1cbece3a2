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

use crate::common::activations::TensorFunction;
use crate::common::dropout::Dropout;
use crate::roberta::RobertaConfig;
use crate::SentimentError;
use std::borrow::Borrow;
use tch::{nn, Tensor};

#[derive(Debug)]
pub struct RobertaSelfAttention {
    num_attention_heads: i64,
    attention_head_size: i64,
    dropout: Dropout,
    output_attentions: bool,
    query: nn::Linear,
    key: nn::Linear,
    value: nn::Linear,
}

impl RobertaSelfAttention {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> Result<RobertaSelfAttention, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        if config.hidden_size % config.num_attention_heads != 0 {
            return Err(SentimentError::InvalidConfigurationError(format!(
                "hidden size {} is not a multiple of the number of attention heads {}",
                config.hidden_size, config.num_attention_heads
            )));
        }
        let p = p.borrow();

        let query = nn::linear(
            p / "query",
            config.hidden_size,
            config.hidden_size,
            Default::default(),
        );
        let key = nn::linear(
            p / "key",
            config.hidden_size,
            config.hidden_size,
            Default::default(),
        );
        let value = nn::linear(
            p / "value",
            config.hidden_size,
            config.hidden_size,
            Default::default(),
        );

        Ok(RobertaSelfAttention {
            num_attention_heads: config.num_attention_heads,
            attention_head_size: config.hidden_size / config.num_attention_heads,
            dropout: Dropout::new(config.attention_probs_dropout_prob),
            output_attentions: config.output_attentions.unwrap_or(false),
            query,
            key,
            value,
        })
    }

    fn split_heads(&self, x: Tensor, bs: i64) -> Tensor {
        x.view((bs, -1, self.num_attention_heads, self.attention_head_size))
            .transpose(1, 2)
    }

    fn flatten(&self, x: Tensor, bs: i64) -> Tensor {
        x.transpose(1, 2).contiguous().view((
            bs,
            -1,
            self.num_attention_heads * self.attention_head_size,
        ))
    }

    /// `mask` is additive and broadcastable to (*batch size*, *heads*, *sequence_length*, *sequence_length*).
    pub fn forward_t(
        &self,
        hidden_states: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> (Tensor, Option<Tensor>) {
        let bs = hidden_states.size()[0];

        let query_layer = self.split_heads(hidden_states.apply(&self.query), bs);
        let key_layer = self.split_heads(hidden_states.apply(&self.key), bs);
        let value_layer = self.split_heads(hidden_states.apply(&self.value), bs);
        let query_layer: Tensor = query_layer / (self.attention_head_size as f64).sqrt();

        let scores = match mask {
            Some(mask) => query_layer.matmul(&key_layer.transpose(-1, -2)) + mask,
            None => query_layer.matmul(&key_layer.transpose(-1, -2)),
        };

        let weights = scores
            .softmax(-1, scores.kind())
            .apply_t(&self.dropout, train);
        let context = self.flatten(weights.matmul(&value_layer), bs);

        if self.output_attentions {
            (context, Some(weights))
        } else {
            (context, None)
        }
    }
}

#[derive(Debug)]
pub struct RobertaSelfOutput {
    linear: nn::Linear,
    layer_norm: nn::LayerNorm,
    dropout: Dropout,
}

impl RobertaSelfOutput {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> RobertaSelfOutput
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let linear = nn::linear(
            p / "dense",
            config.hidden_size,
            config.hidden_size,
            Default::default(),
        );
        let layer_norm_config = nn::LayerNormConfig {
            eps: config.layer_norm_eps(),
            ..Default::default()
        };
        let layer_norm =
            nn::layer_norm(p / "LayerNorm", vec![config.hidden_size], layer_norm_config);

        RobertaSelfOutput {
            linear,
            layer_norm,
            dropout: Dropout::new(config.hidden_dropout_prob),
        }
    }

    pub fn forward_t(&self, hidden_states: &Tensor, input_tensor: &Tensor, train: bool) -> Tensor {
        let hidden_states: Tensor = input_tensor
            + hidden_states
                .apply(&self.linear)
                .apply_t(&self.dropout, train);
        hidden_states.apply(&self.layer_norm)
    }
}

/// Self-attention block followed by its residual projection.
#[derive(Debug)]
pub struct RobertaAttention {
    _self: RobertaSelfAttention,
    output: RobertaSelfOutput,
}

impl RobertaAttention {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> Result<RobertaAttention, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let _self = RobertaSelfAttention::new(p / "self", config)?;
        let output = RobertaSelfOutput::new(p / "output", config);
        Ok(RobertaAttention { _self, output })
    }

    pub fn forward_t(
        &self,
        hidden_states: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> (Tensor, Option<Tensor>) {
        let (self_output, attention_weights) = self._self.forward_t(hidden_states, mask, train);

        let self_output = self.output.forward_t(&self_output, hidden_states, train);
        (self_output, attention_weights)
    }
}

#[derive(Debug)]
pub struct RobertaIntermediate {
    lin: nn::Linear,
    activation: TensorFunction,
}

impl RobertaIntermediate {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> RobertaIntermediate
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let lin = nn::linear(
            p / "dense",
            config.hidden_size,
            config.intermediate_size,
            Default::default(),
        );
        let activation = config.hidden_act.get_function();
        RobertaIntermediate { lin, activation }
    }

    pub fn forward(&self, hidden_states: &Tensor) -> Tensor {
        (self.activation.get_fn())(&hidden_states.apply(&self.lin))
    }
}

#[derive(Debug)]
pub struct RobertaOutput {
    lin: nn::Linear,
    layer_norm: nn::LayerNorm,
    dropout: Dropout,
}

impl RobertaOutput {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> RobertaOutput
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let lin = nn::linear(
            p / "dense",
            config.intermediate_size,
            config.hidden_size,
            Default::default(),
        );
        let layer_norm_config = nn::LayerNormConfig {
            eps: config.layer_norm_eps(),
            ..Default::default()
        };
        let layer_norm =
            nn::layer_norm(p / "LayerNorm", vec![config.hidden_size], layer_norm_config);

        RobertaOutput {
            lin,
            layer_norm,
            dropout: Dropout::new(config.hidden_dropout_prob),
        }
    }

    pub fn forward_t(&self, hidden_states: &Tensor, input_tensor: &Tensor, train: bool) -> Tensor {
        let hidden_states: Tensor =
            input_tensor + hidden_states.apply(&self.lin).apply_t(&self.dropout, train);
        hidden_states.apply(&self.layer_norm)
    }
}
