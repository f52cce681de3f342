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

use tessera_core::asset::{ObjectDescriptor, ObjectHandle, PersistentKind};
use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::event::ProjectEventPayload;
use tessera_core::id::{AssetId, DynamicIdAllocator, LibraryKind};
use tessera_core::naming::unique_name;
use tessera_core::project::{AssetItem, PrefabPart, Preview};
use tessera_core::services::SaveEntry;
use tessera_data::{AssetCatalog, ItemKey};
use tessera_lanes::dependency_lane::{libraries_for, DependencyResolver};

use super::agent::{no_project, ProjectAgent, SessionData};

/// Identifiers handed out while walking one object hierarchy.
struct IdBatch {
    allocator: DynamicIdAllocator,
    fresh: Vec<(AssetId, ObjectHandle)>,
}

impl IdBatch {
    fn new(counter: u64) -> Self {
        Self {
            allocator: DynamicIdAllocator::begin(counter),
            fresh: Vec::new(),
        }
    }
}

fn missing(what: &str, key: ItemKey) -> ProjectError {
    ProjectError::NotFound(format!("{what} {key:?}"))
}

impl ProjectAgent {
    /// The dynamic id `handle` is already bound to, if the binding is free
    /// for the asset at `owner` (or for a new asset when `owner` is `None`).
    fn reusable_id(&self, catalog: &AssetCatalog, handle: ObjectHandle, owner: Option<ItemKey>) -> Option<AssetId> {
        let id = self.services.registry.to_id(handle)?;
        if id.kind() != Some(LibraryKind::Dynamic) {
            return None;
        }
        match catalog.key_of(id) {
            None => Some(id),
            Some(key) if Some(key) == owner => Some(id),
            Some(_) => None,
        }
    }

    fn id_for(
        &self,
        catalog: &AssetCatalog,
        handle: ObjectHandle,
        owner: Option<ItemKey>,
        batch: &mut IdBatch,
    ) -> ProjectResult<AssetId> {
        if let Some(id) = self.reusable_id(catalog, handle, owner) {
            return Ok(id);
        }
        let id = batch.allocator.allocate()?;
        batch.fresh.push((id, handle));
        Ok(id)
    }

    /// Gives an identifier to every component and child object below
    /// `node` and describes them as prefab parts.
    fn collect_parts(
        &self,
        catalog: &AssetCatalog,
        node: &ObjectDescriptor,
        node_id: AssetId,
        owner: Option<ItemKey>,
        batch: &mut IdBatch,
        parts: &mut Vec<PrefabPart>,
    ) -> ProjectResult<()> {
        let types = &self.services.types;
        for component in &node.components {
            let Some(type_guid) = types.to_guid(&component.asset_type) else {
                log::warn!(
                    "ProjectAgent: component '{}' of '{}' has no type guid, skipping it.",
                    component.asset_type.name,
                    node.name
                );
                continue;
            };
            let id = self.id_for(catalog, component.handle, owner, batch)?;
            parts.push(PrefabPart {
                id,
                parent_id: Some(node_id),
                name: node.name.clone(),
                type_guid,
            });
        }
        for child in &node.children {
            let Some(type_guid) = types.to_guid(&child.asset_type) else {
                log::warn!(
                    "ProjectAgent: child '{}' has unknown type '{}', skipping it.",
                    child.name,
                    child.asset_type.name
                );
                continue;
            };
            let id = self.id_for(catalog, child.handle, owner, batch)?;
            parts.push(PrefabPart {
                id,
                parent_id: Some(node_id),
                name: child.name.clone(),
                type_guid,
            });
            self.collect_parts(catalog, child, id, owner, batch, parts)?;
        }
        Ok(())
    }

    /// Attaches the stored previews of each folder to its assets.
    ///
    /// ## Returns
    /// The children of every folder, in folder order.
    pub async fn get_asset_items(&self, folders: &[ItemKey]) -> ProjectResult<Vec<ItemKey>> {
        let (result, ids) = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            let result = self.get_asset_items_in(&mut data, folders).await;
            let ids = match (&result, data.project.as_ref()) {
                (Ok(keys), Some(project)) => keys
                    .iter()
                    .filter_map(|key| project.catalog.asset(*key))
                    .map(|item| item.id)
                    .collect(),
                _ => Vec::new(),
            };
            (result, ids)
        };
        self.finish(result, ProjectEventPayload::AssetItemsFetched(ids))
    }

    async fn get_asset_items_in(&self, data: &mut SessionData, folders: &[ItemKey]) -> ProjectResult<Vec<ItemKey>> {
        let project = data.project.as_mut().ok_or_else(no_project)?;
        let mut children = Vec::new();
        for folder in folders {
            if !project.catalog.tree().is_folder(*folder) {
                return Err(missing("folder", *folder));
            }
            let path = project
                .catalog
                .path(*folder)
                .ok_or_else(|| missing("folder", *folder))?;
            let previews = self
                .services
                .storage
                .get_previews(&project.info.name, &path)
                .await?;
            for preview in previews {
                match project.catalog.key_of(preview.item_id) {
                    Some(key) if project.catalog.tree().parent(key) == Some(*folder) => {
                        project.catalog.set_preview(key, preview);
                    }
                    _ => log::warn!(
                        "ProjectAgent: preview of {} does not belong to '{path}'.",
                        preview.item_id
                    ),
                }
            }
            children.extend_from_slice(project.catalog.tree().children(*folder));
        }
        Ok(children)
    }

    /// Persists a live object as a new asset under `parent`.
    ///
    /// ## Arguments
    /// * `parent` - Folder receiving the asset.
    /// * `preview` - Thumbnail data stored with the asset.
    /// * `handle` - The object to persist. For prefabs every child object and
    ///   component becomes a part with its own identifier.
    /// * `name_override` - Name to use instead of the object's name. The name
    ///   is made unique among the folder's assets of the same type.
    ///
    /// ## Returns
    /// The identifier of the new asset.
    pub async fn create(
        &self,
        parent: ItemKey,
        preview: Option<Vec<u8>>,
        handle: ObjectHandle,
        name_override: Option<&str>,
    ) -> ProjectResult<AssetId> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.create_in(&mut data, parent, preview, handle, name_override)
                .await
        };
        let payload = ProjectEventPayload::AssetCreated(result.as_ref().ok().copied());
        self.finish(result, payload)
    }

    async fn create_in(
        &self,
        data: &mut SessionData,
        parent: ItemKey,
        preview: Option<Vec<u8>>,
        handle: ObjectHandle,
        name_override: Option<&str>,
    ) -> ProjectResult<AssetId> {
        let SessionData { project, libraries } = data;
        let project = project.as_mut().ok_or_else(no_project)?;
        if !project.catalog.tree().is_folder(parent) {
            return Err(ProjectError::InvalidOperation(format!(
                "{parent:?} is not a folder"
            )));
        }
        libraries.load_scene_dependencies().await;

        let services = &self.services;
        let descriptor = services
            .factory
            .describe(handle)
            .ok_or_else(|| ProjectError::NotFound(format!("object {}", handle.0)))?;
        let (kind, type_guid) = self.persistence_of(&descriptor.asset_type)?;

        let mut batch = IdBatch::new(project.info.asset_identifier);
        let root_id = self.id_for(&project.catalog, handle, None, &mut batch)?;
        let mut parts = Vec::new();
        if kind == PersistentKind::RuntimePrefab {
            self.collect_parts(&project.catalog, &descriptor, root_id, None, &mut batch, &mut parts)?;
        }
        // The identifiers are bound to live objects from here on.
        project.info.asset_identifier = batch.allocator.commit();
        services.registry.register_dynamic_resources(&batch.fresh);

        let object = services.factory.capture(handle, kind)?;
        let mut item = AssetItem::new(root_id, type_guid);
        item.preview = preview.map(|data| Preview {
            item_id: root_id,
            data,
        });
        item.dependencies = object.dependencies.clone();
        item.parts = parts;

        let ext = descriptor.asset_type.extension();
        let desired = name_override.unwrap_or(descriptor.name.as_str());
        let name = unique_name(desired, project.catalog.tree().sibling_names(parent, &ext));
        let folder_path = project
            .catalog
            .path(parent)
            .ok_or_else(|| missing("folder", parent))?;
        let entry = SaveEntry {
            folder_path,
            file_name: format!("{name}{ext}"),
            item: item.clone(),
            object,
        };
        services
            .storage
            .save(&project.info.name, vec![entry], &project.info)
            .await?;

        let part_count = item.parts.len();
        project.catalog.insert_asset(parent, &name, &ext, item)?;
        log::info!("ProjectAgent: created '{name}{ext}' as {root_id} with {part_count} part(s).");
        Ok(root_id)
    }

    /// Captures the current state of live objects into their assets.
    ///
    /// `items[i]` is saved from `handles[i]`. Parts and dependencies are
    /// refreshed from the objects; sub-objects that appeared since the last
    /// save get new identifiers.
    pub async fn save(&self, items: &[ItemKey], handles: &[ObjectHandle]) -> ProjectResult<Vec<AssetId>> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.save_in(&mut data, items, handles).await
        };
        let payload = ProjectEventPayload::AssetsSaved(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }

    async fn save_in(
        &self,
        data: &mut SessionData,
        items: &[ItemKey],
        handles: &[ObjectHandle],
    ) -> ProjectResult<Vec<AssetId>> {
        if items.len() != handles.len() {
            return Err(ProjectError::InvalidOperation(format!(
                "{} items but {} objects to save",
                items.len(),
                handles.len()
            )));
        }
        let SessionData { project, libraries } = data;
        let project = project.as_mut().ok_or_else(no_project)?;
        libraries.load_scene_dependencies().await;

        let services = &self.services;
        let mut batch = IdBatch::new(project.info.asset_identifier);
        let mut staged = Vec::with_capacity(items.len());
        for (key, handle) in items.iter().zip(handles) {
            let current = project.catalog.asset(*key).ok_or_else(|| missing("asset", *key))?;
            let (asset_type, kind) = self.resolve_type(current.type_guid)?;
            let descriptor = services
                .factory
                .describe(*handle)
                .ok_or_else(|| ProjectError::NotFound(format!("object {}", handle.0)))?;
            if descriptor.asset_type != asset_type {
                return Err(ProjectError::InvalidOperation(format!(
                    "object {} is a '{}', asset {} is a '{}'",
                    handle.0, descriptor.asset_type.name, current.id, asset_type.name
                )));
            }
            let root_id = current.id;
            if root_id.kind() == Some(LibraryKind::Dynamic) && services.registry.to_id(*handle) != Some(root_id) {
                batch.fresh.push((root_id, *handle));
            }
            let mut parts = Vec::new();
            if kind == PersistentKind::RuntimePrefab {
                self.collect_parts(&project.catalog, &descriptor, root_id, Some(*key), &mut batch, &mut parts)?;
            }
            staged.push((*key, *handle, kind, parts));
        }
        project.info.asset_identifier = batch.allocator.commit();
        services.registry.register_dynamic_resources(&batch.fresh);

        let mut entries = Vec::with_capacity(staged.len());
        let mut updated = Vec::with_capacity(staged.len());
        for (key, handle, kind, parts) in staged {
            let object = services.factory.capture(handle, kind)?;
            let tree = project.catalog.tree();
            let node = tree.get(key).ok_or_else(|| missing("asset", key))?;
            let folder_path = node
                .parent()
                .and_then(|parent| tree.path(parent))
                .ok_or_else(|| ProjectError::InvalidOperation(format!("asset {key:?} is not in the project tree")))?;
            let mut item = project
                .catalog
                .asset(key)
                .cloned()
                .ok_or_else(|| missing("asset", key))?;
            item.dependencies = object.dependencies.clone();
            item.parts = parts;
            entries.push(SaveEntry {
                folder_path,
                file_name: node.name_ext(),
                item: item.clone(),
                object,
            });
            updated.push((key, item));
        }
        services
            .storage
            .save(&project.info.name, entries, &project.info)
            .await?;

        let mut ids = Vec::with_capacity(updated.len());
        for (key, item) in updated {
            ids.push(item.id);
            project.catalog.replace_asset(key, item)?;
        }
        log::info!("ProjectAgent: saved {} asset(s).", ids.len());
        Ok(ids)
    }

    /// Loads an asset with everything it depends on.
    ///
    /// Dependencies living in libraries that are not loaded yet trigger a
    /// joined batch of library loads before anything is materialized.
    /// Dependencies that stay unresolved are logged and skipped.
    ///
    /// ## Returns
    /// The live object of the asset. A scene becomes the active scene.
    pub async fn load(&self, item: ItemKey) -> ProjectResult<ObjectHandle> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.load_in(&mut data, item).await
        };
        let payload = ProjectEventPayload::AssetLoaded(result.as_ref().ok().copied());
        self.finish(result, payload)
    }

    async fn load_in(&self, data: &mut SessionData, key: ItemKey) -> ProjectResult<ObjectHandle> {
        let SessionData { project, libraries } = data;
        let project = project.as_mut().ok_or_else(no_project)?;
        let services = &self.services;

        let root = project.catalog.asset(key).ok_or_else(|| missing("asset", key))?;
        let root_id = root.id;
        let (_, root_kind) = self.resolve_type(root.type_guid)?;
        if root_kind != PersistentKind::Scene {
            if let Some(handle) = services.registry.from_id(root_id) {
                return Ok(handle);
            }
        }

        let registry = services.registry.clone();
        let is_mapped = move |id: AssetId| id != root_id && registry.is_mapped(id);
        let types = services.types.as_ref();
        let mut resolution = DependencyResolver::new(&project.catalog, types, &is_mapped).resolve(root_id);

        if !resolution.is_complete() {
            let ordinals = libraries_for(&resolution.unresolved, |ordinal| {
                services.registry.is_library_loaded(ordinal)
            });
            libraries.load_all(ordinals).await;

            let pending: Vec<AssetId> = resolution.unresolved.iter().copied().collect();
            for id in &pending {
                let Some(info) = services.registry.describe(*id) else {
                    continue;
                };
                let Some(guid) = types.to_guid(&info.asset_type) else {
                    log::warn!("ProjectAgent: library object {id} has unknown type '{}'.", info.asset_type.name);
                    continue;
                };
                project
                    .catalog
                    .insert_stub(&info.name, &info.asset_type.extension(), AssetItem::new(*id, guid));
            }
            DependencyResolver::new(&project.catalog, types, &is_mapped).resolve_pending(&mut resolution, pending);
            if !resolution.is_complete() {
                log::warn!(
                    "ProjectAgent: {} dependencies of {root_id} could not be resolved.",
                    resolution.unresolved.len()
                );
            }
        }

        let mut targets: Vec<(ItemKey, AssetId, String)> = resolution
            .to_materialize
            .iter()
            .filter(|key| !project.catalog.tree().is_detached(**key))
            .filter_map(|key| {
                let item = project.catalog.asset(*key)?;
                Some((*key, item.id, project.catalog.path(*key)?))
            })
            .collect();
        // Dependencies are written before the root so its references resolve.
        targets.sort_by_key(|(_, id, _)| (*id == root_id, *id));
        let paths: Vec<String> = targets.iter().map(|(_, _, path)| path.clone()).collect();
        let objects = services.storage.load(&project.info.name, &paths).await?;
        if objects.len() != targets.len() {
            return Err(ProjectError::Storage(format!(
                "{} objects returned for {} paths",
                objects.len(),
                targets.len()
            )));
        }

        let owned_ids: Vec<AssetId> = targets
            .iter()
            .filter_map(|(key, _, _)| project.catalog.asset(*key))
            .flat_map(|item| item.all_ids())
            .collect();
        let ordinals = libraries_for(&owned_ids, |ordinal| services.registry.is_library_loaded(ordinal));
        if !ordinals.is_empty() {
            libraries.load_all(ordinals).await;
        }

        let mut fresh = Vec::new();
        for ((_, id, _), object) in targets.iter().zip(&objects) {
            if object.kind == PersistentKind::Scene || services.registry.is_mapped(*id) {
                continue;
            }
            if id.kind() != Some(LibraryKind::Dynamic) {
                log::warn!("ProjectAgent: library object {id} is not loaded, its state is skipped.");
                continue;
            }
            fresh.push((*id, services.factory.instantiate(&object.asset_type)?));
        }
        services.registry.register_dynamic_resources(&fresh);

        let mut root_handle = None;
        for ((_, id, _), object) in targets.iter().zip(&objects) {
            let handle = if object.kind == PersistentKind::Scene {
                if *id != root_id {
                    log::warn!("ProjectAgent: scene {id} is a dependency of {root_id}, skipping it.");
                    continue;
                }
                let handle = services.factory.write_scene(object)?;
                if id.kind() == Some(LibraryKind::Dynamic) {
                    services.registry.register_dynamic_resources(&[(*id, handle)]);
                }
                handle
            } else {
                let Some(handle) = services.registry.from_id(*id) else {
                    continue;
                };
                services.factory.write_to(object, handle)?;
                handle
            };
            if *id == root_id {
                root_handle = Some(handle);
            }
        }

        log::info!("ProjectAgent: loaded {root_id} with {} asset(s).", targets.len());
        root_handle
            .or_else(|| services.registry.from_id(root_id))
            .ok_or_else(|| ProjectError::NotFound(format!("asset {root_id} could not be materialized")))
    }
}
