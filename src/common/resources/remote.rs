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

use super::*;
use crate::common::error::SentimentError;
use cached_path::{Cache, Options, ProgressBar};
use dirs::cache_dir;
use lazy_static::lazy_static;
use std::path::PathBuf;

/// # Remote resource that will be downloaded and cached locally on demand
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RemoteResource {
    /// Remote path/url for the resource
    pub url: String,
    /// Local subdirectory of the cache root where this resource is saved
    pub cache_subdir: String,
}

impl RemoteResource {
    /// Creates a new RemoteResource from an URL and a custom local path. Note that this does not
    /// download the resource (only declares the remote and local locations)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sentiment_api::resources::RemoteResource;
    /// let config_resource = RemoteResource::new("http://config_json_location", "configs");
    /// ```
    pub fn new(url: &str, cache_subdir: &str) -> RemoteResource {
        RemoteResource {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
        }
    }

    /// Creates a new RemoteResource from a `(cache subdirectory, URL)` pair, as exposed by the
    /// pretrained resource constants of each model module.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sentiment_api::resources::RemoteResource;
    /// use sentiment_api::roberta::RobertaConfigResources;
    /// let config_resource =
    ///     RemoteResource::from_pretrained(RobertaConfigResources::TWITTER_ROBERTA_SENTIMENT);
    /// ```
    pub fn from_pretrained(name_url_tuple: (&str, &str)) -> RemoteResource {
        let cache_subdir = name_url_tuple.0.to_string();
        let url = name_url_tuple.1.to_string();
        RemoteResource { url, cache_subdir }
    }
}

impl ResourceProvider for RemoteResource {
    /// Gets the local path for a remote resource.
    ///
    /// The remote resource is downloaded on first use and served from the cache afterwards.
    fn get_local_path(&self) -> Result<PathBuf, SentimentError> {
        let cache = CACHE.as_ref().map_err(|e| {
            SentimentError::FileDownloadError(format!("cache unavailable: {e}"))
        })?;
        let cached_path = cache
            .cached_path_with_options(&self.url, &Options::default().subdir(&self.cache_subdir))?;
        Ok(cached_path)
    }
}

impl From<RemoteResource> for Box<dyn ResourceProvider> {
    fn from(resource: RemoteResource) -> Self {
        Box::new(resource)
    }
}

lazy_static! {
    /// # Global cache directory
    /// Model files are saved under `.sentiment-api` in the user cache directory of the current
    /// system (`$XDG_CACHE_HOME` on Linux).
    pub static ref CACHE: Result<Cache, String> = Cache::builder()
        .dir(get_cache_directory())
        .progress_bar(Some(ProgressBar::Light))
        .build()
        .map_err(|e| e.to_string());
}

fn get_cache_directory() -> PathBuf {
    let mut home = cache_dir().unwrap_or_else(std::env::temp_dir);
    home.push(".sentiment-api");
    home
}
