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

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use tessera_core::id::LibraryKind;
use tessera_core::library::AssetBundle;
use tessera_core::project::AssetBundleInfo;
use tessera_core::services::{BundleLoader, ObjectRegistry};
use tessera_lanes::import_lane::build_library;

use crate::config::ProjectConfig;

/// What happened to each ordinal of a [`LibraryAgent::load_all`] batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ordinals that are now loaded.
    pub loaded: Vec<u32>,
    /// Ordinals whose load failed.
    pub failed: Vec<u32>,
    /// Ordinals no library name is known for.
    pub unknown: Vec<u32>,
    /// Ordinals that were already loaded before the batch.
    pub skipped: Vec<u32>,
}

impl LoadReport {
    /// Returns `true` if no load failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum LoadOutcome {
    Loaded(u32),
    Bundle(u32, AssetBundle),
    Failed(u32),
    Unknown(u32),
}

/// Loads and unloads libraries, and keeps the bundles and bundle
/// descriptors of the open project.
pub struct LibraryAgent {
    registry: Arc<dyn ObjectRegistry>,
    bundles: Arc<dyn BundleLoader>,
    config: ProjectConfig,
    bundle_infos: HashMap<u32, AssetBundleInfo>,
    loaded_bundles: HashMap<u32, AssetBundle>,
}

impl LibraryAgent {
    /// Creates an agent with no bundle descriptors.
    pub fn new(
        registry: Arc<dyn ObjectRegistry>,
        bundles: Arc<dyn BundleLoader>,
        config: ProjectConfig,
    ) -> Self {
        Self {
            registry,
            bundles,
            config,
            bundle_infos: HashMap::new(),
            loaded_bundles: HashMap::new(),
        }
    }

    /// Replaces the bundle descriptors, typically with those of a project
    /// that was just opened.
    pub fn set_bundle_infos(&mut self, infos: impl IntoIterator<Item = AssetBundleInfo>) {
        self.bundle_infos = infos.into_iter().map(|info| (info.ordinal, info)).collect();
    }

    /// Adds or replaces one bundle descriptor.
    pub fn insert_bundle_info(&mut self, info: AssetBundleInfo) {
        self.bundle_infos.insert(info.ordinal, info);
    }

    /// The descriptor of the bundle at `ordinal`.
    pub fn bundle_info(&self, ordinal: u32) -> Option<&AssetBundleInfo> {
        self.bundle_infos.get(&ordinal)
    }

    /// The descriptor of the bundle called `name`.
    pub fn bundle_info_by_name(&self, name: &str) -> Option<&AssetBundleInfo> {
        self.bundle_infos.values().find(|info| info.unique_name == name)
    }

    /// The bundle currently loaded at `ordinal`.
    pub fn loaded_bundle(&self, ordinal: u32) -> Option<&AssetBundle> {
        self.loaded_bundles.get(&ordinal)
    }

    /// Name of the library owning `ordinal`, if one is known.
    pub fn library_name(&self, ordinal: u32) -> Option<String> {
        match LibraryKind::of_ordinal(ordinal)? {
            LibraryKind::Static => self.config.static_library(ordinal).map(str::to_string),
            LibraryKind::Scene => self.config.scene_library(ordinal),
            LibraryKind::Bundled => self.bundle_info(ordinal).map(|info| info.unique_name.clone()),
            LibraryKind::Dynamic => None,
        }
    }

    /// Loads every ordinal of `ordinals` that is not loaded yet.
    ///
    /// All loads are dispatched at once and joined; one failing load is
    /// logged and does not stop the others.
    ///
    /// ## Returns
    /// The per-ordinal outcome of the batch.
    pub async fn load_all(&mut self, ordinals: impl IntoIterator<Item = u32>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut pending = Vec::new();
        for ordinal in ordinals.into_iter().collect::<BTreeSet<_>>() {
            if self.registry.is_library_loaded(ordinal) {
                report.skipped.push(ordinal);
            } else {
                pending.push(ordinal);
            }
        }
        if pending.is_empty() {
            return report;
        }

        log::debug!("LibraryAgent: loading libraries {:?}.", pending);
        let outcomes = join_all(pending.iter().map(|ordinal| self.load_one(*ordinal))).await;

        for outcome in outcomes {
            match outcome {
                LoadOutcome::Loaded(ordinal) => report.loaded.push(ordinal),
                LoadOutcome::Bundle(ordinal, bundle) => {
                    if self.register_bundle(ordinal, bundle) {
                        report.loaded.push(ordinal);
                    } else {
                        report.failed.push(ordinal);
                    }
                }
                LoadOutcome::Failed(ordinal) => report.failed.push(ordinal),
                LoadOutcome::Unknown(ordinal) => report.unknown.push(ordinal),
            }
        }
        if !report.is_success() {
            log::warn!("LibraryAgent: failed to load libraries {:?}.", report.failed);
        }
        report
    }

    async fn load_one(&self, ordinal: u32) -> LoadOutcome {
        let Some(name) = self.library_name(ordinal) else {
            log::warn!("LibraryAgent: no library is known for ordinal {ordinal}.");
            return LoadOutcome::Unknown(ordinal);
        };
        match LibraryKind::of_ordinal(ordinal) {
            Some(LibraryKind::Bundled) => match self.bundles.load(&name).await {
                Some(bundle) => LoadOutcome::Bundle(ordinal, bundle),
                None => {
                    log::warn!("LibraryAgent: unable to load bundle '{name}'.");
                    LoadOutcome::Failed(ordinal)
                }
            },
            _ => {
                if self.registry.load_library(&name, ordinal).await {
                    LoadOutcome::Loaded(ordinal)
                } else {
                    log::warn!("LibraryAgent: unable to load library '{name}' ({ordinal}).");
                    LoadOutcome::Failed(ordinal)
                }
            }
        }
    }

    fn register_bundle(&mut self, ordinal: u32, bundle: AssetBundle) -> bool {
        let Some(info) = self.bundle_infos.get(&ordinal) else {
            return false;
        };
        let library = build_library(&bundle, info);
        if !self.registry.add_library(&library) {
            log::warn!("LibraryAgent: ordinal {ordinal} is already bound, bundle '{}' dropped.", bundle.name);
            return false;
        }
        log::info!(
            "LibraryAgent: bundle '{}' registered as library {ordinal} ({} assets).",
            bundle.name,
            library.asset_count()
        );
        self.loaded_bundles.insert(ordinal, bundle);
        true
    }

    /// Loads the scene-dependency chain in order, stopping at the first
    /// library that does not exist.
    ///
    /// ## Returns
    /// The number of chain libraries that are loaded afterwards.
    pub async fn load_scene_dependencies(&self) -> usize {
        let bounds = LibraryKind::Scene.bounds();
        let mut count = 0;
        for ordinal in bounds.first_ordinal..=bounds.last_ordinal() {
            if self.registry.is_library_loaded(ordinal) {
                count += 1;
                continue;
            }
            let Some(name) = self.config.scene_library(ordinal) else {
                break;
            };
            if !self.registry.load_library(&name, ordinal).await {
                if ordinal == bounds.first_ordinal {
                    log::warn!("LibraryAgent: scene dependencies library '{name}' is missing.");
                }
                break;
            }
            count += 1;
        }
        count
    }

    /// Unloads one library and forgets its bundle.
    pub fn unload(&mut self, ordinal: u32) {
        self.registry.unload_library(ordinal);
        self.loaded_bundles.remove(&ordinal);
    }

    /// Unloads every library and drops every loaded bundle. Descriptors are
    /// kept.
    pub fn unload_all(&mut self) {
        self.registry.unload_libraries();
        self.loaded_bundles.clear();
    }

    /// Unloads everything and forgets the bundle descriptors.
    pub fn reset(&mut self) {
        self.unload_all();
        self.bundle_infos.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tessera_core::asset::{AssetKind, AssetType, ObjectHandle, ObjectInfo};
    use tessera_core::id::AssetId;
    use tessera_core::library::{AssetLibrary, BundleAsset, BundleObject};
    use tessera_core::project::AssetBundleItemInfo;

    /// Records library loads; only names in `available` exist.
    #[derive(Default)]
    struct Registry {
        available: Vec<String>,
        loaded: Mutex<Vec<u32>>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectRegistry for Registry {
        fn is_mapped(&self, _id: AssetId) -> bool {
            false
        }
        fn from_id(&self, _id: AssetId) -> Option<ObjectHandle> {
            None
        }
        fn to_id(&self, _handle: ObjectHandle) -> Option<AssetId> {
            None
        }
        fn describe(&self, _id: AssetId) -> Option<ObjectInfo> {
            None
        }
        fn register_dynamic_resources(&self, _resources: &[(AssetId, ObjectHandle)]) {}
        fn unregister_dynamic_resources(&self) {}
        fn is_library_loaded(&self, ordinal: u32) -> bool {
            self.loaded.lock().expect("lock").contains(&ordinal)
        }
        async fn load_library(&self, name: &str, ordinal: u32) -> bool {
            self.requests.lock().expect("lock").push(name.to_string());
            if self.available.iter().any(|n| n == name) {
                self.loaded.lock().expect("lock").push(ordinal);
                true
            } else {
                false
            }
        }
        async fn fetch_library(&self, _name: &str) -> Option<AssetLibrary> {
            None
        }
        fn add_library(&self, library: &AssetLibrary) -> bool {
            let mut loaded = self.loaded.lock().expect("lock");
            if loaded.contains(&library.ordinal) {
                return false;
            }
            loaded.push(library.ordinal);
            true
        }
        fn unload_library(&self, ordinal: u32) {
            self.loaded.lock().expect("lock").retain(|o| *o != ordinal);
        }
        fn unload_libraries(&self) {
            self.loaded.lock().expect("lock").clear();
        }
    }

    struct Bundles;

    #[async_trait]
    impl BundleLoader for Bundles {
        async fn load(&self, name: &str) -> Option<AssetBundle> {
            (name == "props").then(|| AssetBundle {
                name: "props".into(),
                assets: vec![BundleAsset {
                    path: "assets/red.mat".into(),
                    object: BundleObject::new("red", AssetType::new("Engine.Material", AssetKind::Material)),
                }],
            })
        }
        async fn list_bundles(&self) -> Vec<String> {
            vec!["props".into()]
        }
    }

    fn agent(available: &[&str]) -> (LibraryAgent, Arc<Registry>) {
        let registry = Arc::new(Registry {
            available: available.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        let config = ProjectConfig {
            asset_libraries: vec!["BuiltIn".into(), "Terrain".into()],
            ..Default::default()
        };
        let agent = LibraryAgent::new(registry.clone(), Arc::new(Bundles), config);
        (agent, registry)
    }

    fn props_info(ordinal: u32, unique_name: &str) -> AssetBundleInfo {
        AssetBundleInfo {
            unique_name: unique_name.into(),
            ordinal,
            identifier: 1,
            items: vec![AssetBundleItemInfo {
                path: "assets/red.mat".into(),
                id: 0,
                parent_id: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_block_the_batch() {
        let (mut agent, registry) = agent(&["BuiltIn"]);
        agent.insert_bundle_info(props_info(128, "props"));

        let report = agent.load_all([0, 1, 128, 7]).await;
        assert_eq!(report.loaded, vec![0, 128]);
        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.unknown, vec![7]);
        assert!(agent.loaded_bundle(128).is_some());
        assert!(registry.is_library_loaded(128));
    }

    #[tokio::test]
    async fn test_loaded_ordinals_are_skipped() {
        let (mut agent, registry) = agent(&["BuiltIn"]);
        agent.load_all([0]).await;
        let report = agent.load_all([0, 0]).await;
        assert_eq!(report.skipped, vec![0]);
        assert_eq!(registry.requests.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_bundle_fails_its_ordinal() {
        let (mut agent, _registry) = agent(&[]);
        agent.insert_bundle_info(props_info(129, "characters"));
        let report = agent.load_all([129]).await;
        assert_eq!(report.failed, vec![129]);
        assert!(agent.loaded_bundle(129).is_none());
    }

    #[tokio::test]
    async fn test_scene_chain_stops_at_first_gap() {
        let (agent, registry) = agent(&["SceneDeps", "SceneDeps2", "SceneDeps4"]);
        assert_eq!(agent.load_scene_dependencies().await, 2);
        assert_eq!(
            *registry.requests.lock().expect("lock"),
            vec!["SceneDeps", "SceneDeps2", "SceneDeps3"]
        );
    }

    #[tokio::test]
    async fn test_missing_first_scene_library_loads_nothing() {
        let (agent, registry) = agent(&[]);
        assert_eq!(agent.load_scene_dependencies().await, 0);
        assert_eq!(registry.requests.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_unload_all_keeps_descriptors() {
        let (mut agent, registry) = agent(&["BuiltIn"]);
        agent.insert_bundle_info(props_info(128, "props"));
        agent.load_all([0, 128]).await;

        agent.unload_all();
        assert!(!registry.is_library_loaded(0));
        assert!(agent.loaded_bundle(128).is_none());
        assert_eq!(agent.bundle_info_by_name("props").map(|i| i.ordinal), Some(128));

        agent.reset();
        assert!(agent.bundle_info(128).is_none());
    }
}
