//! # RoBERTa: A Robustly Optimized BERT Pretraining Approach (Liu et al.)
//!
//! Implementation of the RoBERTa encoder ([https://arxiv.org/abs/1907.11692](https://arxiv.org/abs/1907.11692) Liu, Ott, Goyal, Du, Joshi, Chen, Levy, Lewis, Zettlemoyer, Stoyanov, 2019)
//! with a sequence classification head:
//! - Base model: `roberta_model::RobertaModel`
//! - Sequence classification: `roberta_model::RobertaForSequenceClassification`
//!
//! # Model set-up and pre-trained weights loading
//!
//! All models expect the following resources:
//! - Configuration file expected to have a structure following the [Transformers library](https://github.com/huggingface/transformers)
//! - Model weights with parameter names following the Transformers library, either as `.safetensors` or converted to the libtorch `.ot` format
//! - `RobertaTokenizer` using a `vocab.json` vocabulary and `merges.txt` 2-gram merges
//!
//! Pretrained resources for the Twitter sentiment checkpoint can be downloaded using `RemoteResource`.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! #
//! use tch::{nn, Device};
//! # use std::path::PathBuf;
//! use rust_tokenizers::tokenizer::RobertaTokenizer;
//! use sentiment_api::resources::{LocalResource, ResourceProvider};
//! use sentiment_api::roberta::{RobertaConfig, RobertaForSequenceClassification};
//! use sentiment_api::Config;
//!
//! let config_resource = LocalResource::from(PathBuf::from("path/to/config.json"));
//! let vocab_resource = LocalResource::from(PathBuf::from("path/to/vocab.json"));
//! let merges_resource = LocalResource::from(PathBuf::from("path/to/merges.txt"));
//! let weights_resource = LocalResource::from(PathBuf::from("path/to/model.safetensors"));
//! let config_path = config_resource.get_local_path()?;
//! let vocab_path = vocab_resource.get_local_path()?;
//! let merges_path = merges_resource.get_local_path()?;
//! let weights_path = weights_resource.get_local_path()?;
//!
//! let device = Device::cuda_if_available();
//! let mut vs = nn::VarStore::new(device);
//! let tokenizer = RobertaTokenizer::from_file(vocab_path, merges_path, false, true)?;
//! let config = RobertaConfig::from_file(config_path)?;
//! let model = RobertaForSequenceClassification::new(vs.root(), &config)?;
//! vs.load(weights_path)?;
//!
//! # Ok(())
//! # }
//! ```

mod attention;
mod embeddings;
mod encoder;
mod roberta_model;

pub use attention::{RobertaAttention, RobertaIntermediate, RobertaOutput, RobertaSelfAttention};
pub use embeddings::RobertaEmbeddings;
pub use encoder::{RobertaEncoder, RobertaEncoderOutput, RobertaLayer, RobertaLayerOutput};
pub use roberta_model::{
    RobertaClassificationHead, RobertaConfig, RobertaConfigResources,
    RobertaForSequenceClassification, RobertaMergesResources, RobertaModel,
    RobertaModelOutput, RobertaModelResources, RobertaSequenceClassificationOutput,
    RobertaVocabResources,
};
