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

//! Weight loading that does not rely on the file extension: cached downloads are stored under
//! extension-less names, so the format is read from the file content.

use crate::common::error::SentimentError;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tch::nn::VarStore;
use tch::{no_grad, Tensor};

/// Serialization format of a weights file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightsFormat {
    /// `safetensors` archive
    SafeTensors,
    /// libtorch archive (`rust_model.ot`) or Python `torch.save` archive (`pytorch_model.bin`)
    Torch,
}

impl WeightsFormat {
    /// A safetensors file starts with the little-endian length of its JSON header, followed by
    /// the header itself.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<WeightsFormat, SentimentError> {
        let mut prefix = [0u8; 9];
        let mut file = File::open(path.as_ref())?;
        let read = file.read(&mut prefix)?;
        if read == prefix.len() && prefix[8] == b'{' {
            let header_len = u64::from_le_bytes([
                prefix[0], prefix[1], prefix[2], prefix[3], prefix[4], prefix[5], prefix[6],
                prefix[7],
            ]);
            if header_len > 0 && header_len < file.metadata()?.len() {
                return Ok(WeightsFormat::SafeTensors);
            }
        }
        Ok(WeightsFormat::Torch)
    }
}

fn read_named_tensors(
    path: &Path,
    var_store: &VarStore,
) -> Result<HashMap<String, Tensor>, SentimentError> {
    let named_tensors = match WeightsFormat::detect(path)? {
        WeightsFormat::SafeTensors => Tensor::read_safetensors(path)?,
        WeightsFormat::Torch => Tensor::load_multi_with_device(path, var_store.device())
            .or_else(|libtorch_error| {
                Tensor::loadz_multi_with_device(path, var_store.device()).map_err(|_| {
                    SentimentError::TchError(format!(
                        "{} is neither a libtorch nor a torch.save archive: {libtorch_error}",
                        path.display()
                    ))
                })
            })?,
    };
    Ok(named_tensors.into_iter().collect())
}

/// Copies the weights stored at `path` into every variable of `var_store`.
///
/// Entries of the file without a matching variable are skipped, a variable without a matching
/// entry is an error.
pub fn load_weights<P: AsRef<Path>>(
    var_store: &mut VarStore,
    path: P,
) -> Result<(), SentimentError> {
    let path = path.as_ref();
    let named_tensors = read_named_tensors(path, var_store)?;
    let mut variables = var_store.variables();
    let skipped = named_tensors
        .keys()
        .filter(|name| !variables.contains_key(name.as_str()))
        .count();

    no_grad(|| -> Result<(), SentimentError> {
        for (name, variable) in variables.iter_mut() {
            let source = named_tensors.get(name).ok_or_else(|| {
                SentimentError::TchError(format!("cannot find {name} in {}", path.display()))
            })?;
            if source.size() != variable.size() {
                return Err(SentimentError::TchError(format!(
                    "shape mismatch for {name}: expected {:?}, found {:?}",
                    variable.size(),
                    source.size()
                )));
            }
            variable.f_copy_(&source.to_device(variable.device()))?;
        }
        Ok(())
    })?;
    debug!(
        "loaded {} variables from {} ({} unused entries)",
        variables.len(),
        path.display(),
        skipped
    );
    Ok(())
}
