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

use std::collections::BTreeSet;

use tessera_core::asset::PersistentKind;
use tessera_core::error::{ProjectError, ProjectResult, StorageError};
use tessera_core::event::ProjectEventPayload;
use tessera_core::id::{bundle_ordinal, AssetId};
use tessera_core::library::AssetLibrary;
use tessera_core::naming::unique_name;
use tessera_core::project::{AssetBundleInfo, AssetItem, ImportItem, ImportStatus};
use tessera_core::services::SaveEntry;
use tessera_data::{ItemKey, ProjectTree};
use tessera_lanes::import_lane::{build_library, generate_identifiers, ImportReconciler};

use super::agent::{no_project, OpenProject, ProjectAgent, SessionData};

impl ProjectAgent {
    /// Scans a library into a tree of import candidates.
    ///
    /// ## Arguments
    /// * `name` - Library or bundle name.
    /// * `built_in` - `true` for a configured static library, `false` for
    ///   an external bundle. A bundle gets an ordinal the first time it is
    ///   scanned, and its identifier descriptor is extended and saved on
    ///   every scan.
    ///
    /// ## Returns
    /// The candidates, laid out like the project tree they would land in.
    pub async fn load_import_items(&self, name: &str, built_in: bool) -> ProjectResult<ProjectTree<ImportItem>> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.load_import_items_in(&mut data, name, built_in).await
        };
        let count = result
            .as_ref()
            .map(|tree| tree.leaves(tree.root()).len())
            .unwrap_or_default();
        self.finish(result, ProjectEventPayload::ImportItemsLoaded(count))
    }

    async fn load_import_items_in(
        &self,
        data: &mut SessionData,
        name: &str,
        built_in: bool,
    ) -> ProjectResult<ProjectTree<ImportItem>> {
        let SessionData { project, libraries } = data;
        let project = project.as_mut().ok_or_else(no_project)?;

        let library = if built_in {
            self.fetch_static_library(name).await?
        } else {
            let storage = &self.services.storage;
            let bundle = self
                .services
                .bundles
                .load(name)
                .await
                .ok_or_else(|| ProjectError::NotFound(format!("bundle '{name}'")))?;

            let known = libraries.bundle_info_by_name(name).cloned();
            let (mut info, is_new) = match known {
                Some(info) => (info, false),
                None => match storage.load_bundle_info(&project.info.name, name).await {
                    Ok(info) => (info, false),
                    Err(StorageError::NotFound(_)) => {
                        let ordinal = bundle_ordinal(project.info.bundle_identifier)?;
                        (AssetBundleInfo::new(name, ordinal), true)
                    }
                    Err(e) => return Err(e.into()),
                },
            };
            let added = generate_identifiers(&bundle, &mut info)?;
            // Descriptor and advanced counter land in one write.
            let mut updated = project.info.clone();
            if is_new {
                updated.bundle_identifier += 1;
            }
            storage.save_bundle_info(&project.info.name, &info, &updated).await?;
            project.info = updated;
            if is_new {
                log::info!("ProjectAgent: bundle '{name}' takes ordinal {}.", info.ordinal);
            }
            log::debug!("ProjectAgent: bundle '{name}' scanned, {added} new identifier(s).");

            let library = build_library(&bundle, &info);
            libraries.insert_bundle_info(info);
            library
        };

        let tree = ImportReconciler::new(&project.catalog, self.services.types.as_ref()).reconcile(&library)?;
        let leaves = tree.leaves(tree.root());
        let conflicts = leaves
            .iter()
            .filter_map(|key| tree.leaf(*key))
            .filter(|item| item.status == ImportStatus::Conflict)
            .count();
        log::info!(
            "ProjectAgent: '{name}' offers {} import item(s), {conflicts} in conflict.",
            leaves.len()
        );
        Ok(tree)
    }

    async fn fetch_static_library(&self, name: &str) -> ProjectResult<AssetLibrary> {
        let ordinal = self
            .config
            .static_ordinal(name)
            .ok_or_else(|| ProjectError::NotFound(format!("static library '{name}' is not configured")))?;
        let mut library = self
            .services
            .registry
            .fetch_library(name)
            .await
            .ok_or_else(|| ProjectError::NotFound(format!("static library '{name}'")))?;
        library.ordinal = ordinal;
        Ok(library)
    }

    /// Drops the object descriptions and previews held by import
    /// candidates.
    ///
    /// ## Returns
    /// The number of candidates released.
    pub async fn unload_import_items(&self, tree: &mut ProjectTree<ImportItem>) -> ProjectResult<usize> {
        let result = {
            let _guard = self.session.enter()?;
            let mut released = 0;
            for key in tree.leaves(tree.root()) {
                if let Some(item) = tree.leaf_mut(key) {
                    item.object = None;
                    item.preview = None;
                    released += 1;
                }
            }
            Ok(released)
        };
        let payload = ProjectEventPayload::ImportItemsUnloaded(*result.as_ref().unwrap_or(&0));
        self.finish(result, payload)
    }

    /// Commits import candidates into the project.
    ///
    /// Every candidate needs a preview and a known type, and all of them
    /// must come from the same library. The library is loaded for the
    /// duration of the import if it was not already. Assets already owning
    /// the candidate's identifier or one of its part identifiers are
    /// replaced.
    ///
    /// ## Returns
    /// The identifiers of the imported assets.
    pub async fn import(&self, tree: &ProjectTree<ImportItem>, items: &[ItemKey]) -> ProjectResult<Vec<AssetId>> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.import_in(&mut data, tree, items).await
        };
        let payload = ProjectEventPayload::Imported(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }

    async fn import_in(
        &self,
        data: &mut SessionData,
        tree: &ProjectTree<ImportItem>,
        items: &[ItemKey],
    ) -> ProjectResult<Vec<AssetId>> {
        let SessionData { project, libraries } = data;
        let project = project.as_mut().ok_or_else(no_project)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut ordinals = BTreeSet::new();
        let mut candidates = Vec::with_capacity(items.len());
        for key in items {
            let item = tree
                .leaf(*key)
                .ok_or_else(|| ProjectError::NotFound(format!("import item {key:?}")))?;
            if item.preview.is_none() {
                return Err(ProjectError::InvalidOperation(format!(
                    "import item {} has no preview",
                    item.id
                )));
            }
            let (_, kind) = self.resolve_type(item.type_guid)?;
            ordinals.insert(item.id.ordinal());
            candidates.push((*key, item, kind));
        }
        let ordinal = match ordinals.iter().collect::<Vec<_>>().as_slice() {
            [ordinal] => **ordinal,
            _ => {
                return Err(ProjectError::InvalidOperation(
                    "import items must come from exactly one library".into(),
                ))
            }
        };

        let registry = &self.services.registry;
        let was_loaded = registry.is_library_loaded(ordinal);
        if !was_loaded {
            libraries.load_all([ordinal]).await;
            if !registry.is_library_loaded(ordinal) {
                return Err(ProjectError::NotFound(format!("library {ordinal}")));
            }
        }
        let result = self.commit_import(project, tree, &candidates).await;
        if !was_loaded {
            libraries.unload(ordinal);
        }
        result
    }

    async fn commit_import(
        &self,
        project: &mut OpenProject,
        tree: &ProjectTree<ImportItem>,
        candidates: &[(ItemKey, &ImportItem, PersistentKind)],
    ) -> ProjectResult<Vec<AssetId>> {
        let services = &self.services;
        let mut staged = project.catalog.clone();
        let mut replaced_paths = Vec::new();
        let mut entries = Vec::with_capacity(candidates.len());
        let mut ids = Vec::with_capacity(candidates.len());

        for (key, item, kind) in candidates {
            let handle = services
                .registry
                .from_id(item.id)
                .ok_or_else(|| ProjectError::NotFound(format!("library object {}", item.id)))?;
            let object = services.factory.capture(handle, *kind)?;

            let mut owners = Vec::new();
            for id in std::iter::once(item.id).chain(item.parts.iter().map(|part| part.id)) {
                if let Some(owner) = staged.key_of(id) {
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
            }
            for owner in owners {
                if !staged.tree().is_detached(owner) {
                    if let Some(path) = staged.path(owner) {
                        replaced_paths.push(path);
                    }
                }
                staged.remove(owner)?;
            }

            let node = tree
                .get(*key)
                .ok_or_else(|| ProjectError::NotFound(format!("import item {key:?}")))?;
            let folder_path = node
                .parent()
                .and_then(|parent| tree.path(parent))
                .ok_or_else(|| ProjectError::InvalidOperation(format!("import item {} has no folder", item.id)))?;
            let folder = staged.ensure_folder_path(&folder_path)?;
            let name = unique_name(&node.name, staged.tree().sibling_names(folder, &node.ext));

            let asset = AssetItem {
                id: item.id,
                type_guid: item.type_guid,
                preview: item.preview.clone(),
                dependencies: object.dependencies.clone(),
                parts: item.parts.clone(),
            };
            staged.insert_asset(folder, &name, &node.ext, asset.clone())?;
            entries.push(SaveEntry {
                folder_path,
                file_name: format!("{name}{}", node.ext),
                item: asset,
                object,
            });
            ids.push(item.id);
        }

        if !replaced_paths.is_empty() {
            services
                .storage
                .delete(&project.info.name, &replaced_paths)
                .await?;
        }
        services
            .storage
            .save(&project.info.name, entries, &project.info)
            .await?;
        project.catalog = staged;
        log::info!(
            "ProjectAgent: imported {} asset(s), replaced {} path(s).",
            ids.len(),
            replaced_paths.len()
        );
        Ok(ids)
    }
}
