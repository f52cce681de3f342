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

//! The project tree and its identifier index, kept in step.

use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::id::AssetId;
use tessera_core::project::{AssetItem, Preview, ProjectItemRecord};

use crate::index::AssetIndex;
use crate::tree::{ItemKey, ProjectTree};

/// Owns the project item tree and the index over it.
///
/// Every mutation that adds, replaces or removes an asset goes through the
/// catalog so the root id and all part ids of an asset are bound or unbound
/// together.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    tree: ProjectTree<AssetItem>,
    index: AssetIndex,
}

impl AssetCatalog {
    /// An empty catalog with a root folder named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            tree: ProjectTree::new(root_name),
            index: AssetIndex::new(),
        }
    }

    /// Rebuilds the catalog from a storage snapshot, indexing every asset
    /// under its root id and part ids.
    pub fn from_record(record: &ProjectItemRecord) -> ProjectResult<Self> {
        let tree = ProjectTree::from_record(record)?;
        let mut index = AssetIndex::new();
        for key in tree.leaves(tree.root()) {
            if let Some(item) = tree.leaf(key) {
                index.put_all(item.all_ids(), key);
            }
        }
        log::debug!("Catalog rebuilt with {} indexed identifiers.", index.len());
        Ok(Self { tree, index })
    }

    /// Read access to the tree.
    pub fn tree(&self) -> &ProjectTree<AssetItem> {
        &self.tree
    }

    /// Read access to the index.
    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    /// Key of the root folder.
    pub fn root(&self) -> ItemKey {
        self.tree.root()
    }

    /// Path of `key`.
    pub fn path(&self, key: ItemKey) -> Option<String> {
        self.tree.path(key)
    }

    /// The asset at `key`.
    pub fn asset(&self, key: ItemKey) -> Option<&AssetItem> {
        self.tree.leaf(key)
    }

    /// The node owning `id`.
    pub fn key_of(&self, id: AssetId) -> Option<ItemKey> {
        self.index.get(id)
    }

    /// The asset owning `id`, through its root or one of its parts.
    pub fn asset_by_id(&self, id: AssetId) -> Option<&AssetItem> {
        self.key_of(id).and_then(|key| self.tree.leaf(key))
    }

    /// Returns `true` if `id` is indexed.
    pub fn contains_id(&self, id: AssetId) -> bool {
        self.index.contains(id)
    }

    /// Adds an empty folder.
    pub fn insert_folder(&mut self, parent: ItemKey, name: &str) -> ProjectResult<ItemKey> {
        self.tree.insert_folder(parent, name)
    }

    /// Returns the folder at `path`, creating missing ones.
    pub fn ensure_folder_path(&mut self, path: &str) -> ProjectResult<ItemKey> {
        self.tree.ensure_folder_path(path)
    }

    /// Adds an asset under `parent` and indexes all of its identifiers.
    pub fn insert_asset(
        &mut self,
        parent: ItemKey,
        name: &str,
        ext: &str,
        item: AssetItem,
    ) -> ProjectResult<ItemKey> {
        let ids: Vec<AssetId> = item.all_ids().collect();
        let key = self.tree.insert_leaf(parent, name, ext, item)?;
        self.index.put_all(ids, key);
        Ok(key)
    }

    /// Adds a detached asset standing in for an object that lives in a
    /// library, and indexes it.
    pub fn insert_stub(&mut self, name: &str, ext: &str, item: AssetItem) -> ItemKey {
        let ids: Vec<AssetId> = item.all_ids().collect();
        let key = self.tree.insert_detached(name, ext, item);
        self.index.put_all(ids, key);
        key
    }

    /// Replaces the metadata of the asset at `key`, re-binding identifiers.
    ///
    /// ## Returns
    /// The previous metadata.
    pub fn replace_asset(&mut self, key: ItemKey, item: AssetItem) -> ProjectResult<AssetItem> {
        let slot = self
            .tree
            .leaf_mut(key)
            .ok_or_else(|| ProjectError::NotFound(format!("asset {key:?}")))?;
        let previous = std::mem::replace(slot, item);
        self.index.remove(&previous, key);
        if let Some(current) = self.tree.leaf(key) {
            self.index.put_all(current.all_ids(), key);
        }
        Ok(previous)
    }

    /// Attaches the preview to the asset at `key`.
    pub fn set_preview(&mut self, key: ItemKey, preview: Preview) -> bool {
        match self.tree.leaf_mut(key) {
            Some(item) => {
                item.preview = Some(preview);
                true
            }
            None => false,
        }
    }

    /// Attaches a detached node under `parent`.
    pub fn attach(&mut self, key: ItemKey, parent: ItemKey) -> ProjectResult<()> {
        self.tree.attach(key, parent)
    }

    /// Renames an item, keeping its extension.
    pub fn rename(&mut self, key: ItemKey, new_name: &str) -> ProjectResult<()> {
        self.tree.rename(key, new_name)
    }

    /// Moves an item under another folder.
    pub fn move_to(&mut self, key: ItemKey, parent: ItemKey) -> ProjectResult<()> {
        self.tree.move_to(key, parent)
    }

    /// Removes an asset or a folder with everything below it, unbinding
    /// every identifier of every removed asset.
    ///
    /// ## Returns
    /// The removed assets.
    pub fn remove(&mut self, key: ItemKey) -> ProjectResult<Vec<AssetItem>> {
        let removed = self.tree.remove(key)?;
        let mut items = Vec::with_capacity(removed.len());
        for (leaf_key, item) in removed {
            self.index.remove(&item, leaf_key);
            items.push(item);
        }
        Ok(items)
    }

    /// Removes every detached stub.
    ///
    /// ## Returns
    /// The number of stubs removed.
    pub fn remove_stubs(&mut self) -> usize {
        let stubs = self.tree.detached();
        let mut count = 0;
        for key in stubs {
            if self.remove(key).is_ok() {
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::asset::TypeGuid;
    use tessera_core::project::PrefabPart;

    fn prefab(root: u64, parts: &[u64]) -> AssetItem {
        let guid = TypeGuid::from_type_name("Engine.GameObject");
        let mut item = AssetItem::new(AssetId::from_raw(root), guid);
        item.parts = parts
            .iter()
            .map(|id| PrefabPart {
                id: AssetId::from_raw(*id),
                parent_id: Some(AssetId::from_raw(root)),
                name: format!("Child{id}"),
                type_guid: guid,
            })
            .collect();
        item
    }

    #[test]
    fn test_insert_asset_indexes_parts() {
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let key = catalog
            .insert_asset(root, "Crate", ".rtprefab", prefab(10, &[11, 12]))
            .expect("insert");

        assert_eq!(catalog.key_of(AssetId::from_raw(12)), Some(key));
        assert_eq!(
            catalog.asset_by_id(AssetId::from_raw(11)).map(|i| i.id),
            Some(AssetId::from_raw(10))
        );
    }

    #[test]
    fn test_failed_insert_indexes_nothing() {
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        catalog
            .insert_asset(root, "Crate", ".rtprefab", prefab(10, &[]))
            .expect("insert");
        assert!(catalog
            .insert_asset(root, "Crate", ".rtprefab", prefab(20, &[21]))
            .is_err());
        assert!(!catalog.contains_id(AssetId::from_raw(20)));
        assert!(!catalog.contains_id(AssetId::from_raw(21)));
    }

    #[test]
    fn test_remove_folder_unbinds_everything_below() {
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let folder = catalog.insert_folder(root, "Props").expect("folder");
        let nested = catalog.insert_folder(folder, "Nested").expect("folder");
        catalog
            .insert_asset(folder, "A", ".rtprefab", prefab(1, &[2, 3]))
            .expect("insert");
        catalog
            .insert_asset(nested, "B", ".rtprefab", prefab(4, &[5]))
            .expect("insert");

        let removed = catalog.remove(folder).expect("remove");
        assert_eq!(removed.len(), 2);
        assert!(catalog.index().is_empty());
    }

    #[test]
    fn test_replace_asset_rebinds_parts() {
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let key = catalog
            .insert_asset(root, "A", ".rtprefab", prefab(1, &[2, 3]))
            .expect("insert");

        let previous = catalog.replace_asset(key, prefab(1, &[4])).expect("replace");
        assert_eq!(previous.parts.len(), 2);
        assert!(!catalog.contains_id(AssetId::from_raw(2)));
        assert!(!catalog.contains_id(AssetId::from_raw(3)));
        assert_eq!(catalog.key_of(AssetId::from_raw(4)), Some(key));
        assert_eq!(catalog.key_of(AssetId::from_raw(1)), Some(key));
    }

    #[test]
    fn test_stubs_are_detached_and_removable() {
        let mut catalog = AssetCatalog::new("Assets");
        let stub = catalog.insert_stub("Plank", ".rtmesh", prefab(99, &[]));
        assert!(catalog.tree().is_detached(stub));
        assert!(catalog.contains_id(AssetId::from_raw(99)));

        assert_eq!(catalog.remove_stubs(), 1);
        assert!(!catalog.contains_id(AssetId::from_raw(99)));
    }
}
