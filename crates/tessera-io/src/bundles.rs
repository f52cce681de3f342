// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tessera_core::library::AssetBundle;
use tessera_core::services::BundleLoader;

/// Serves bundles that were inserted ahead of time.
#[derive(Debug, Default)]
pub struct MemoryBundleLoader {
    bundles: RwLock<BTreeMap<String, AssetBundle>>,
}

impl MemoryBundleLoader {
    /// Creates a loader with no bundles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a bundle, keyed by its name.
    pub fn insert(&self, bundle: AssetBundle) {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(bundle.name.clone(), bundle);
    }

    /// Removes a bundle.
    pub fn remove(&self, name: &str) -> Option<AssetBundle> {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

#[async_trait]
impl BundleLoader for MemoryBundleLoader {
    async fn load(&self, name: &str) -> Option<AssetBundle> {
        let bundle = self
            .bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if bundle.is_none() {
            log::debug!("MemoryBundleLoader: no bundle named '{name}'.");
        }
        bundle
    }

    async fn list_bundles(&self) -> Vec<String> {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_list_and_remove() {
        let loader = MemoryBundleLoader::new();
        for name in ["props", "characters"] {
            loader.insert(AssetBundle {
                name: name.into(),
                assets: Vec::new(),
            });
        }
        assert_eq!(loader.list_bundles().await, vec!["characters", "props"]);
        assert!(loader.load("props").await.is_some());

        loader.remove("props");
        assert!(loader.load("props").await.is_none());
    }
}
