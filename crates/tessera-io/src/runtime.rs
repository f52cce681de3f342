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

//! A small in-memory object world standing in for a live engine.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tessera_core::asset::{
    AssetKind, AssetType, ComponentDescriptor, ObjectDescriptor, ObjectHandle, ObjectInfo,
    PersistentKind, PersistentObject,
};
use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::id::{compose, AssetId, LibraryKind};
use tessera_core::library::AssetLibrary;
use tessera_core::services::{ObjectFactory, ObjectRegistry};

#[derive(Debug, Clone)]
struct RuntimeObject {
    name: String,
    asset_type: AssetType,
    parent: Option<ObjectHandle>,
    components: Vec<ObjectHandle>,
    children: Vec<ObjectHandle>,
    references: Vec<ObjectHandle>,
    payload: Vec<u8>,
}

impl RuntimeObject {
    fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            name: name.into(),
            asset_type,
            parent: None,
            components: Vec::new(),
            children: Vec::new(),
            references: Vec::new(),
            payload: Vec::new(),
        }
    }
}

/// Serialized form of one object and everything it owns.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    name: String,
    asset_type: AssetType,
    id: Option<AssetId>,
    payload: Vec<u8>,
    references: Vec<AssetId>,
    components: Vec<Snapshot>,
    children: Vec<Snapshot>,
}

#[derive(Debug, Default)]
struct RuntimeState {
    next_handle: u64,
    objects: HashMap<ObjectHandle, RuntimeObject>,
    ids: HashMap<AssetId, ObjectHandle>,
    handles: HashMap<ObjectHandle, AssetId>,
    dynamic: HashSet<AssetId>,
    loaded: BTreeMap<u32, Vec<AssetId>>,
    libraries: HashMap<String, AssetLibrary>,
    scene: Option<ObjectHandle>,
}

impl RuntimeState {
    fn spawn(&mut self, object: RuntimeObject) -> ObjectHandle {
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.objects.insert(handle, object);
        handle
    }

    fn bind(&mut self, id: AssetId, handle: ObjectHandle) {
        if let Some(previous) = self.ids.insert(id, handle) {
            self.handles.remove(&previous);
        }
        if let Some(previous) = self.handles.insert(handle, id) {
            if previous != id {
                self.ids.remove(&previous);
                self.dynamic.remove(&previous);
            }
        }
        if id.kind() == Some(LibraryKind::Dynamic) {
            self.dynamic.insert(id);
        }
    }

    fn unbind(&mut self, id: AssetId) {
        if let Some(handle) = self.ids.remove(&id) {
            self.handles.remove(&handle);
        }
        self.dynamic.remove(&id);
    }

    fn attach_child(&mut self, parent: ObjectHandle, child: ObjectHandle) {
        if let Some(object) = self.objects.get_mut(&child) {
            object.parent = Some(parent);
        }
        if let Some(object) = self.objects.get_mut(&parent) {
            object.children.push(child);
        }
    }

    fn attach_component(&mut self, owner: ObjectHandle, component: ObjectHandle) {
        if let Some(object) = self.objects.get_mut(&component) {
            object.parent = Some(owner);
        }
        if let Some(object) = self.objects.get_mut(&owner) {
            object.components.push(component);
        }
    }

    fn destroy(&mut self, handle: ObjectHandle) {
        let Some(object) = self.objects.remove(&handle) else {
            return;
        };
        if let Some(id) = self.handles.remove(&handle) {
            self.ids.remove(&id);
            self.dynamic.remove(&id);
        }
        if let Some(parent) = object.parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|c| *c != handle);
            parent.components.retain(|c| *c != handle);
        }
        if self.scene == Some(handle) {
            self.scene = None;
        }
        for owned in object.components.into_iter().chain(object.children) {
            self.destroy(owned);
        }
    }

    fn describe(&self, handle: ObjectHandle) -> Option<ObjectDescriptor> {
        let object = self.objects.get(&handle)?;
        Some(ObjectDescriptor {
            handle,
            name: object.name.clone(),
            asset_type: object.asset_type.clone(),
            components: object
                .components
                .iter()
                .filter_map(|c| {
                    self.objects.get(c).map(|component| ComponentDescriptor {
                        handle: *c,
                        asset_type: component.asset_type.clone(),
                    })
                })
                .collect(),
            children: object
                .children
                .iter()
                .filter_map(|c| self.describe(*c))
                .collect(),
        })
    }

    fn snapshot(&self, handle: ObjectHandle, owned: &mut HashSet<AssetId>) -> ProjectResult<Snapshot> {
        let object = self
            .objects
            .get(&handle)
            .ok_or_else(|| ProjectError::NotFound(format!("object {}", handle.0)))?;
        let id = self.handles.get(&handle).copied();
        if let Some(id) = id {
            owned.insert(id);
        }
        let references = object
            .references
            .iter()
            .map(|target| {
                self.handles.get(target).copied().ok_or_else(|| {
                    ProjectError::InvalidOperation(format!(
                        "'{}' references object {} which has no identifier",
                        object.name, target.0
                    ))
                })
            })
            .collect::<ProjectResult<Vec<_>>>()?;
        Ok(Snapshot {
            name: object.name.clone(),
            asset_type: object.asset_type.clone(),
            id,
            payload: object.payload.clone(),
            references,
            components: object
                .components
                .iter()
                .map(|c| self.snapshot(*c, owned))
                .collect::<ProjectResult<_>>()?,
            children: object
                .children
                .iter()
                .map(|c| self.snapshot(*c, owned))
                .collect::<ProjectResult<_>>()?,
        })
    }

    /// Rebuilds `target` from `snapshot`, collecting unresolved references.
    fn restore(
        &mut self,
        snapshot: &Snapshot,
        target: ObjectHandle,
        pending: &mut Vec<(ObjectHandle, Vec<AssetId>)>,
    ) {
        let owned = match self.objects.get_mut(&target) {
            Some(object) => {
                object.name = snapshot.name.clone();
                object.payload = snapshot.payload.clone();
                object.references.clear();
                let mut owned = std::mem::take(&mut object.components);
                owned.append(&mut object.children);
                owned
            }
            None => return,
        };
        for handle in owned {
            self.destroy(handle);
        }
        if let Some(id) = snapshot.id {
            self.bind(id, target);
        }
        pending.push((target, snapshot.references.clone()));

        for component in &snapshot.components {
            let handle = self.spawn(RuntimeObject::new(&component.name, component.asset_type.clone()));
            self.attach_component(target, handle);
            self.restore(component, handle, pending);
        }
        for child in &snapshot.children {
            let handle = self.spawn(RuntimeObject::new(&child.name, child.asset_type.clone()));
            self.attach_child(target, handle);
            self.restore(child, handle, pending);
        }
    }

    fn add_library(&mut self, library: &AssetLibrary) -> bool {
        if self.loaded.contains_key(&library.ordinal) {
            return false;
        }
        let Some(kind) = LibraryKind::of_ordinal(library.ordinal) else {
            log::warn!("MemoryRuntime: ordinal {} is outside every library range.", library.ordinal);
            return false;
        };

        let mut bound = Vec::new();
        let mut entries = Vec::new();
        library.visit_assets(|_, asset| entries.push(asset.clone()));
        for asset in entries {
            let Some(info) = &asset.object else {
                continue;
            };
            let Some(root) = self.bind_library_object(kind, library.ordinal, asset.local_id, info, None, &mut bound)
            else {
                continue;
            };
            let mut locals = HashMap::from([(asset.local_id, root)]);
            for part in &asset.parts {
                let parent = part
                    .parent_local_id
                    .and_then(|local| locals.get(&local).copied())
                    .unwrap_or(root);
                if let Some(handle) =
                    self.bind_library_object(kind, library.ordinal, part.local_id, &part.object, Some(parent), &mut bound)
                {
                    locals.insert(part.local_id, handle);
                }
            }
        }
        log::debug!(
            "MemoryRuntime: library {} bound {} objects.",
            library.ordinal,
            bound.len()
        );
        self.loaded.insert(library.ordinal, bound);
        true
    }

    fn bind_library_object(
        &mut self,
        kind: LibraryKind,
        ordinal: u32,
        local_id: u32,
        info: &ObjectInfo,
        parent: Option<ObjectHandle>,
        bound: &mut Vec<AssetId>,
    ) -> Option<ObjectHandle> {
        let id = match compose(kind, ordinal, local_id) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("MemoryRuntime: skipping '{}': {e}", info.name);
                return None;
            }
        };
        let handle = self.spawn(RuntimeObject::new(&info.name, info.asset_type.clone()));
        match (parent, info.asset_type.kind) {
            (Some(owner), AssetKind::Component) => self.attach_component(owner, handle),
            (Some(parent), _) => self.attach_child(parent, handle),
            (None, _) => {}
        }
        self.bind(id, handle);
        bound.push(id);
        Some(handle)
    }

    fn unload_library(&mut self, ordinal: u32) {
        let Some(ids) = self.loaded.remove(&ordinal) else {
            return;
        };
        for id in ids {
            if let Some(handle) = self.ids.get(&id).copied() {
                self.destroy(handle);
            }
        }
    }
}

/// An engine stand-in that owns objects, identifier bindings and loaded
/// libraries.
///
/// Libraries installed with [`MemoryRuntime::install_library`] can later be
/// loaded by name. Captured objects are JSON snapshots of the whole
/// hierarchy, with references stored as identifiers.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    state: RwLock<RuntimeState>,
}

impl MemoryRuntime {
    /// Creates an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RuntimeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RuntimeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes a named library available to [`ObjectRegistry::load_library`].
    pub fn install_library(&self, name: impl Into<String>, library: AssetLibrary) {
        self.write().libraries.insert(name.into(), library);
    }

    /// Creates a root object.
    pub fn spawn(&self, name: &str, asset_type: AssetType) -> ObjectHandle {
        self.write().spawn(RuntimeObject::new(name, asset_type))
    }

    /// Creates an object parented under `parent`.
    pub fn add_child(&self, parent: ObjectHandle, name: &str, asset_type: AssetType) -> ObjectHandle {
        let mut state = self.write();
        let child = state.spawn(RuntimeObject::new(name, asset_type));
        state.attach_child(parent, child);
        child
    }

    /// Adds a component to `owner`. Components carry the owner's name.
    pub fn add_component(&self, owner: ObjectHandle, asset_type: AssetType) -> ObjectHandle {
        let mut state = self.write();
        let name = state
            .objects
            .get(&owner)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        let component = state.spawn(RuntimeObject::new(name, asset_type));
        state.attach_component(owner, component);
        component
    }

    /// Makes `from` reference `to`.
    pub fn add_reference(&self, from: ObjectHandle, to: ObjectHandle) {
        if let Some(object) = self.write().objects.get_mut(&from) {
            object.references.push(to);
        }
    }

    /// Replaces the opaque data of an object.
    pub fn set_payload(&self, handle: ObjectHandle, payload: Vec<u8>) {
        if let Some(object) = self.write().objects.get_mut(&handle) {
            object.payload = payload;
        }
    }

    /// The opaque data of an object.
    pub fn payload(&self, handle: ObjectHandle) -> Option<Vec<u8>> {
        self.read().objects.get(&handle).map(|o| o.payload.clone())
    }

    /// Objects referenced by `handle`.
    pub fn references(&self, handle: ObjectHandle) -> Vec<ObjectHandle> {
        self.read()
            .objects
            .get(&handle)
            .map(|o| o.references.clone())
            .unwrap_or_default()
    }

    /// Returns `true` while the object is alive.
    pub fn exists(&self, handle: ObjectHandle) -> bool {
        self.read().objects.contains_key(&handle)
    }

    /// Ordinals of every bound library, ascending.
    pub fn loaded_libraries(&self) -> Vec<u32> {
        self.read().loaded.keys().copied().collect()
    }

    /// Root of the active scene.
    pub fn scene(&self) -> Option<ObjectHandle> {
        self.read().scene
    }

    /// Number of dynamic bindings.
    pub fn dynamic_count(&self) -> usize {
        self.read().dynamic.len()
    }
}

#[async_trait]
impl ObjectRegistry for MemoryRuntime {
    fn is_mapped(&self, id: AssetId) -> bool {
        self.read().ids.contains_key(&id)
    }

    fn from_id(&self, id: AssetId) -> Option<ObjectHandle> {
        self.read().ids.get(&id).copied()
    }

    fn to_id(&self, handle: ObjectHandle) -> Option<AssetId> {
        self.read().handles.get(&handle).copied()
    }

    fn describe(&self, id: AssetId) -> Option<ObjectInfo> {
        let state = self.read();
        let handle = state.ids.get(&id)?;
        state.objects.get(handle).map(|object| ObjectInfo {
            name: object.name.clone(),
            asset_type: object.asset_type.clone(),
        })
    }

    fn register_dynamic_resources(&self, resources: &[(AssetId, ObjectHandle)]) {
        let mut state = self.write();
        for (id, handle) in resources {
            state.bind(*id, *handle);
        }
    }

    fn unregister_dynamic_resources(&self) {
        let mut state = self.write();
        let dynamic: Vec<AssetId> = state.dynamic.iter().copied().collect();
        for id in dynamic {
            state.unbind(id);
        }
    }

    fn is_library_loaded(&self, ordinal: u32) -> bool {
        self.read().loaded.contains_key(&ordinal)
    }

    async fn load_library(&self, name: &str, ordinal: u32) -> bool {
        let mut state = self.write();
        let Some(library) = state.libraries.get(name).cloned() else {
            log::warn!("MemoryRuntime: no library named '{name}'.");
            return false;
        };
        if state.loaded.contains_key(&ordinal) {
            return true;
        }
        state.add_library(&AssetLibrary { ordinal, ..library })
    }

    async fn fetch_library(&self, name: &str) -> Option<AssetLibrary> {
        self.read().libraries.get(name).cloned()
    }

    fn add_library(&self, library: &AssetLibrary) -> bool {
        self.write().add_library(library)
    }

    fn unload_library(&self, ordinal: u32) {
        self.write().unload_library(ordinal);
    }

    fn unload_libraries(&self) {
        let mut state = self.write();
        let ordinals: Vec<u32> = state.loaded.keys().copied().collect();
        for ordinal in ordinals {
            state.unload_library(ordinal);
        }
    }
}

impl ObjectFactory for MemoryRuntime {
    fn describe(&self, handle: ObjectHandle) -> Option<ObjectDescriptor> {
        self.read().describe(handle)
    }

    fn capture(&self, handle: ObjectHandle, kind: PersistentKind) -> ProjectResult<PersistentObject> {
        let state = self.read();
        let mut owned = HashSet::new();
        let snapshot = state.snapshot(handle, &mut owned)?;

        let mut dependencies = Vec::new();
        let mut stack = vec![&snapshot];
        while let Some(node) = stack.pop() {
            for id in &node.references {
                if !owned.contains(id) && !dependencies.contains(id) {
                    dependencies.push(*id);
                }
            }
            stack.extend(node.components.iter().chain(&node.children));
        }

        let data = serde_json::to_vec(&snapshot)
            .map_err(|e| ProjectError::InvalidOperation(format!("cannot serialize '{}': {e}", snapshot.name)))?;
        Ok(PersistentObject {
            kind,
            name: snapshot.name.clone(),
            asset_type: snapshot.asset_type.clone(),
            dependencies,
            data,
        })
    }

    fn instantiate(&self, asset_type: &AssetType) -> ProjectResult<ObjectHandle> {
        if asset_type.kind == AssetKind::Component {
            return Err(ProjectError::InvalidOperation(format!(
                "component '{}' cannot exist on its own",
                asset_type.name
            )));
        }
        Ok(self.spawn(asset_type.short_name(), asset_type.clone()))
    }

    fn write_to(&self, object: &PersistentObject, target: ObjectHandle) -> ProjectResult<()> {
        let snapshot: Snapshot = serde_json::from_slice(&object.data)
            .map_err(|e| ProjectError::InvalidOperation(format!("cannot read '{}': {e}", object.name)))?;
        let mut state = self.write();
        if !state.objects.contains_key(&target) {
            return Err(ProjectError::NotFound(format!("object {}", target.0)));
        }

        let mut pending = Vec::new();
        state.restore(&snapshot, target, &mut pending);
        // References are resolved once every owned object is bound.
        for (handle, ids) in pending {
            let mut references = Vec::with_capacity(ids.len());
            for id in ids {
                match state.ids.get(&id) {
                    Some(resolved) => references.push(*resolved),
                    None => log::warn!("MemoryRuntime: '{}' references unmapped {id}.", object.name),
                }
            }
            if let Some(restored) = state.objects.get_mut(&handle) {
                restored.references = references;
            }
        }
        Ok(())
    }

    fn write_scene(&self, object: &PersistentObject) -> ProjectResult<ObjectHandle> {
        self.clear_scene();
        let root = self.instantiate(&object.asset_type)?;
        self.write_to(object, root)?;
        self.write().scene = Some(root);
        Ok(root)
    }

    fn clear_scene(&self) {
        let mut state = self.write();
        if let Some(scene) = state.scene.take() {
            state.destroy(scene);
        }
    }

    fn destroy(&self, handle: ObjectHandle) {
        self.write().destroy(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::library::{LibraryAsset, LibraryFolder, LibraryPart};

    fn prefab() -> AssetType {
        AssetType::new("Engine.Prefab", AssetKind::Prefab)
    }

    fn transform() -> AssetType {
        AssetType::new("Engine.Transform", AssetKind::Component)
    }

    fn library(ordinal: u32) -> AssetLibrary {
        let mut root = LibraryFolder::new("Assets");
        root.assets.push(LibraryAsset {
            name: "Crate".into(),
            local_id: 1,
            object: Some(ObjectInfo {
                name: "Crate".into(),
                asset_type: prefab(),
            }),
            parts: vec![
                LibraryPart {
                    local_id: 2,
                    parent_local_id: Some(1),
                    object: ObjectInfo {
                        name: "Crate".into(),
                        asset_type: transform(),
                    },
                },
                LibraryPart {
                    local_id: 3,
                    parent_local_id: Some(1),
                    object: ObjectInfo {
                        name: "Lid".into(),
                        asset_type: prefab(),
                    },
                },
            ],
        });
        AssetLibrary { ordinal, root }
    }

    #[tokio::test]
    async fn test_load_library_binds_assets_and_parts() {
        let runtime = MemoryRuntime::new();
        runtime.install_library("Core", library(0));
        assert!(runtime.load_library("Core", 3).await);

        let root_id = compose(LibraryKind::Static, 3, 1).expect("id");
        let root = runtime.from_id(root_id).expect("root bound");
        let descriptor = ObjectFactory::describe(&runtime, root).expect("described");
        assert_eq!(descriptor.components.len(), 1);
        assert_eq!(descriptor.children[0].name, "Lid");
        assert!(runtime.is_library_loaded(3));

        runtime.unload_library(3);
        assert!(!runtime.is_mapped(root_id));
        assert!(!runtime.exists(root));
    }

    #[tokio::test]
    async fn test_unknown_library_is_not_loaded() {
        let runtime = MemoryRuntime::new();
        assert!(!runtime.load_library("Missing", 0).await);
        assert!(runtime.fetch_library("Missing").await.is_none());
    }

    #[test]
    fn test_add_library_rejects_bound_ordinal() {
        let runtime = MemoryRuntime::new();
        assert!(runtime.add_library(&library(130)));
        assert!(!runtime.add_library(&library(130)));
        assert_eq!(runtime.loaded_libraries(), vec![130]);
    }

    #[test]
    fn test_capture_reports_external_references() {
        let runtime = MemoryRuntime::new();
        let material = runtime.spawn("Red", AssetType::new("Engine.Material", AssetKind::Material));
        let material_id = compose(LibraryKind::Static, 0, 7).expect("id");
        runtime.register_dynamic_resources(&[(material_id, material)]);

        let root = runtime.spawn("Crate", prefab());
        let lid = runtime.add_child(root, "Lid", prefab());
        runtime.add_reference(lid, material);
        runtime.add_reference(root, lid);
        let lid_id = compose(LibraryKind::Dynamic, 384, 2).expect("id");
        runtime.register_dynamic_resources(&[(lid_id, lid)]);

        let captured = runtime.capture(root, PersistentKind::RuntimePrefab).expect("capture");
        assert_eq!(captured.dependencies, vec![material_id]);
    }

    #[test]
    fn test_capture_fails_on_unmapped_reference() {
        let runtime = MemoryRuntime::new();
        let root = runtime.spawn("Crate", prefab());
        let other = runtime.spawn("Other", prefab());
        runtime.add_reference(root, other);
        let result = runtime.capture(root, PersistentKind::RuntimePrefab);
        assert!(matches!(result, Err(ProjectError::InvalidOperation(_))));
    }

    #[test]
    fn test_write_to_restores_hierarchy_ids_and_references() {
        let runtime = MemoryRuntime::new();
        let root = runtime.spawn("Crate", prefab());
        let lid = runtime.add_child(root, "Lid", prefab());
        runtime.add_component(lid, transform());
        runtime.set_payload(lid, vec![9]);
        runtime.add_reference(root, lid);
        let lid_id = compose(LibraryKind::Dynamic, 384, 2).expect("id");
        runtime.register_dynamic_resources(&[(lid_id, lid)]);
        let captured = runtime.capture(root, PersistentKind::RuntimePrefab).expect("capture");

        runtime.destroy(root);
        assert!(!runtime.is_mapped(lid_id));

        let target = runtime.instantiate(&prefab()).expect("instantiate");
        runtime.write_to(&captured, target).expect("write");
        let restored_lid = runtime.from_id(lid_id).expect("lid rebound");
        assert_eq!(runtime.references(target), vec![restored_lid]);
        assert_eq!(runtime.payload(restored_lid), Some(vec![9]));
        let descriptor = ObjectFactory::describe(&runtime, target).expect("described");
        assert_eq!(descriptor.name, "Crate");
        assert_eq!(descriptor.children[0].components.len(), 1);
    }

    #[test]
    fn test_unregister_keeps_library_bindings() {
        let runtime = MemoryRuntime::new();
        assert!(runtime.add_library(&library(0)));
        let object = runtime.spawn("Temp", prefab());
        let id = compose(LibraryKind::Dynamic, 384, 0).expect("id");
        runtime.register_dynamic_resources(&[(id, object)]);
        assert_eq!(runtime.dynamic_count(), 1);

        runtime.unregister_dynamic_resources();
        assert!(!runtime.is_mapped(id));
        assert!(runtime.is_mapped(compose(LibraryKind::Static, 0, 1).expect("id")));
    }

    #[test]
    fn test_write_scene_replaces_active_scene() {
        let runtime = MemoryRuntime::new();
        let scene_type = AssetType::new("Engine.Scene", AssetKind::Scene);
        let first = runtime.spawn("Level", scene_type.clone());
        runtime.add_child(first, "Player", prefab());
        let captured = runtime.capture(first, PersistentKind::Scene).expect("capture");

        let loaded = runtime.write_scene(&captured).expect("scene");
        assert_eq!(runtime.scene(), Some(loaded));
        let again = runtime.write_scene(&captured).expect("scene");
        assert!(!runtime.exists(loaded));
        assert_eq!(runtime.scene(), Some(again));
    }
}
