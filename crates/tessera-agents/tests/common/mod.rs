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

#![allow(dead_code)]

use std::sync::Arc;

use tessera_agents::{ProjectAgent, ProjectConfig, ProjectServices};
use tessera_core::asset::{AssetType, PersistentKind, PersistentObject, TypeGuid};
use tessera_core::id::AssetId;
use tessera_core::project::{AssetItem, ProjectInfo};
use tessera_core::services::{SaveEntry, Storage};
use tessera_data::ItemKey;
use tessera_io::{MemoryBundleLoader, MemoryRuntime, MemoryStorage, TypeTable};

pub const PROJECT: &str = "demo";

pub struct Fixture {
    pub agent: ProjectAgent,
    pub storage: Arc<MemoryStorage>,
    pub runtime: Arc<MemoryRuntime>,
    pub bundles: Arc<MemoryBundleLoader>,
    pub types: Arc<TypeTable>,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let storage = Arc::new(MemoryStorage::new());
        let runtime = Arc::new(MemoryRuntime::new());
        let bundles = Arc::new(MemoryBundleLoader::new());
        let types = Arc::new(TypeTable::with_engine_types());
        let services = ProjectServices {
            storage: storage.clone(),
            registry: runtime.clone(),
            factory: runtime.clone(),
            types: types.clone(),
            bundles: bundles.clone(),
        };
        let config = ProjectConfig {
            asset_libraries: vec!["BuiltIn".into()],
            ..Default::default()
        };
        Self {
            agent: ProjectAgent::new(services, config),
            storage,
            runtime,
            bundles,
            types,
        }
    }

    /// Creates and opens the `demo` project.
    pub async fn open() -> Self {
        let fixture = Self::new();
        fixture.agent.create_project(PROJECT).await.expect("create project");
        fixture.agent.open_project(PROJECT).await.expect("open project");
        fixture
    }

    pub fn ty(&self, name: &str) -> AssetType {
        self.types.get(name).cloned().expect("engine type")
    }

    pub async fn root(&self) -> ItemKey {
        self.agent.catalog().await.expect("project is open").root()
    }

    pub async fn key_of(&self, id: AssetId) -> Option<ItemKey> {
        self.agent.catalog().await.and_then(|catalog| catalog.key_of(id))
    }

    pub async fn key_at(&self, path: &str) -> Option<ItemKey> {
        self.agent.catalog().await?.tree().find_by_path(path)
    }

    pub async fn path_of(&self, id: AssetId) -> Option<String> {
        let catalog = self.agent.catalog().await?;
        catalog.path(catalog.key_of(id)?)
    }

    /// Writes an asset straight into storage, bypassing the agent.
    pub async fn seed(&self, folder: &str, name: &str, asset_type: &AssetType, id: AssetId) {
        let guid = TypeGuid::from_type_name(&asset_type.name);
        let entry = SaveEntry {
            folder_path: folder.into(),
            file_name: format!("{name}{}", asset_type.extension()),
            item: AssetItem::new(id, guid),
            object: PersistentObject {
                kind: PersistentKind::Object,
                name: name.into(),
                asset_type: asset_type.clone(),
                dependencies: Vec::new(),
                data: Vec::new(),
            },
        };
        let (info, _) = self.storage.get_project(PROJECT).await.expect("project");
        self.storage
            .save(PROJECT, vec![entry], &info)
            .await
            .expect("seed");
    }

    /// Overwrites the stored project counters.
    pub async fn set_counters(&self, asset_identifier: u64, bundle_identifier: u32) {
        let info = ProjectInfo {
            name: PROJECT.into(),
            asset_identifier,
            bundle_identifier,
        };
        self.storage
            .save(PROJECT, Vec::new(), &info)
            .await
            .expect("counters");
    }
}
