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

use crate::roberta::attention::{RobertaAttention, RobertaIntermediate, RobertaOutput};
use crate::roberta::RobertaConfig;
use crate::SentimentError;
use std::borrow::Borrow;
use tch::{nn, Tensor};

pub struct RobertaLayer {
    attention: RobertaAttention,
    intermediate: RobertaIntermediate,
    output: RobertaOutput,
}

impl RobertaLayer {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> Result<RobertaLayer, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let attention = RobertaAttention::new(p / "attention", config)?;
        let intermediate = RobertaIntermediate::new(p / "intermediate", config);
        let output = RobertaOutput::new(p / "output", config);

        Ok(RobertaLayer {
            attention,
            intermediate,
            output,
        })
    }

    pub fn forward_t(
        &self,
        hidden_states: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> RobertaLayerOutput {
        let (attention_output, attention_weights) =
            self.attention.forward_t(hidden_states, mask, train);

        let output = self.intermediate.forward(&attention_output);
        let output = self.output.forward_t(&output, &attention_output, train);

        RobertaLayerOutput {
            hidden_state: output,
            attention_weights,
        }
    }
}

/// Stack of `num_hidden_layers` transformer layers.
pub struct RobertaEncoder {
    output_attentions: bool,
    output_hidden_states: bool,
    layers: Vec<RobertaLayer>,
}

impl RobertaEncoder {
    pub fn new<'p, P>(p: P, config: &RobertaConfig) -> Result<RobertaEncoder, SentimentError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow() / "layer";

        let layers = (0..config.num_hidden_layers)
            .map(|layer_index| RobertaLayer::new(&p / layer_index, config))
            .collect::<Result<Vec<RobertaLayer>, SentimentError>>()?;

        Ok(RobertaEncoder {
            output_attentions: config.output_attentions.unwrap_or(false),
            output_hidden_states: config.output_hidden_states.unwrap_or(false),
            layers,
        })
    }

    pub fn forward_t(
        &self,
        input: &Tensor,
        mask: Option<&Tensor>,
        train: bool,
    ) -> RobertaEncoderOutput {
        let mut all_hidden_states: Option<Vec<Tensor>> =
            self.output_hidden_states.then(Vec::new);
        let mut all_attentions: Option<Vec<Tensor>> = self.output_attentions.then(Vec::new);

        let mut hidden_state = input.shallow_clone();
        for layer in &self.layers {
            let layer_output = layer.forward_t(&hidden_state, mask, train);
            hidden_state = layer_output.hidden_state;

            if let (Some(attentions), Some(weights)) =
                (all_attentions.as_mut(), layer_output.attention_weights)
            {
                attentions.push(weights);
            }
            if let Some(hidden_states) = all_hidden_states.as_mut() {
                hidden_states.push(hidden_state.copy());
            }
        }

        RobertaEncoderOutput {
            hidden_state,
            all_hidden_states,
            all_attentions,
        }
    }
}

pub struct RobertaLayerOutput {
    pub hidden_state: Tensor,
    pub attention_weights: Option<Tensor>,
}

pub struct RobertaEncoderOutput {
    pub hidden_state: Tensor,
    pub all_hidden_states: Option<Vec<Tensor>>,
    pub all_attentions: Option<Vec<Tensor>>,
}
