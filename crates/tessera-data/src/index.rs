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

//! Identifier → project item lookup.

use std::collections::HashMap;

use tessera_core::id::AssetId;
use tessera_core::project::AssetItem;

use crate::tree::ItemKey;

/// Maps every known identifier to the tree node owning it.
///
/// A composite asset is reachable through its root id and through each of
/// its part ids; all of them resolve to the same [`ItemKey`].
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    entries: HashMap<AssetId, ItemKey>,
}

impl AssetIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node owning `id`.
    pub fn get(&self, id: AssetId) -> Option<ItemKey> {
        self.entries.get(&id).copied()
    }

    /// Binds a single identifier, replacing any previous binding.
    pub fn put(&mut self, id: AssetId, key: ItemKey) {
        self.entries.insert(id, key);
    }

    /// Binds every identifier of a composite asset to the same node.
    pub fn put_all(&mut self, ids: impl IntoIterator<Item = AssetId>, key: ItemKey) {
        self.entries.extend(ids.into_iter().map(|id| (id, key)));
    }

    /// Unbinds the root id and every part id of `item` that still point at
    /// `key`. Ids rebound to another node are left alone.
    ///
    /// ## Returns
    /// The number of identifiers removed.
    pub fn remove(&mut self, item: &AssetItem, key: ItemKey) -> usize {
        let mut removed = 0;
        for id in item.all_ids() {
            if self.entries.get(&id) == Some(&key) {
                self.entries.remove(&id);
                removed += 1;
            }
        }
        removed
    }

    /// Returns `true` if `id` is bound.
    pub fn contains(&self, id: AssetId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of bound identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every binding.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProjectTree;
    use tessera_core::asset::TypeGuid;
    use tessera_core::project::PrefabPart;

    fn composite(root: u64, parts: &[u64]) -> AssetItem {
        let guid = TypeGuid::from_type_name("Engine.GameObject");
        let mut item = AssetItem::new(AssetId::from_raw(root), guid);
        for part in parts {
            item.parts.push(PrefabPart {
                id: AssetId::from_raw(*part),
                parent_id: Some(AssetId::from_raw(root)),
                name: format!("Part{part}"),
                type_guid: guid,
            });
        }
        item
    }

    fn two_keys() -> (ItemKey, ItemKey) {
        let mut tree = ProjectTree::<()>::new("Assets");
        let root = tree.root();
        let a = tree.insert_leaf(root, "A", ".rtprefab", ()).expect("insert");
        let b = tree.insert_leaf(root, "B", ".rtprefab", ()).expect("insert");
        (a, b)
    }

    #[test]
    fn test_put_all_maps_parts_to_same_key() {
        let (key, _) = two_keys();
        let item = composite(1, &[2, 3]);
        let mut index = AssetIndex::new();
        index.put_all(item.all_ids(), key);

        assert_eq!(index.len(), 3);
        for id in [1, 2, 3] {
            assert_eq!(index.get(AssetId::from_raw(id)), Some(key));
        }
    }

    #[test]
    fn test_remove_drops_every_key() {
        let (key, _) = two_keys();
        let item = composite(1, &[2, 3, 4]);
        let mut index = AssetIndex::new();
        index.put_all(item.all_ids(), key);

        assert_eq!(index.remove(&item, key), 4);
        assert!(index.is_empty());
        for id in [1, 2, 3, 4] {
            assert!(!index.contains(AssetId::from_raw(id)));
        }
    }

    #[test]
    fn test_remove_keeps_ids_owned_elsewhere() {
        let (a, b) = two_keys();
        let item = composite(1, &[2]);
        let mut index = AssetIndex::new();
        index.put_all(item.all_ids(), a);
        index.put(AssetId::from_raw(2), b);

        assert_eq!(index.remove(&item, a), 1);
        assert_eq!(index.get(AssetId::from_raw(2)), Some(b));
    }
}
