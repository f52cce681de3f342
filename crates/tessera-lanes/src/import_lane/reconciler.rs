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

use tessera_core::asset::TypeGuid;
use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::id::{compose, AssetId, LibraryKind};
use tessera_core::library::{AssetLibrary, LibraryAsset, LibraryFolder};
use tessera_core::naming::unique_name;
use tessera_core::project::{ImportItem, ImportStatus, PrefabPart};
use tessera_core::services::TypeMap;
use tessera_data::{AssetCatalog, ItemKey, ProjectTree};

/// Classifies the assets of a scanned library against the project catalog.
pub struct ImportReconciler<'a> {
    catalog: &'a AssetCatalog,
    types: &'a dyn TypeMap,
}

impl<'a> ImportReconciler<'a> {
    /// Creates a reconciler over `catalog`.
    pub fn new(catalog: &'a AssetCatalog, types: &'a dyn TypeMap) -> Self {
        Self { catalog, types }
    }

    /// Builds the tree of import candidates for `library`.
    ///
    /// The tree root takes the project root name, so candidate paths match
    /// the project paths they would be imported to. Assets or parts whose
    /// type has no guid are skipped.
    ///
    /// ## Errors
    /// `InvalidOperation` if the library ordinal is outside the identifier
    /// space.
    pub fn reconcile(&self, library: &AssetLibrary) -> ProjectResult<ProjectTree<ImportItem>> {
        let kind = LibraryKind::of_ordinal(library.ordinal).ok_or_else(|| {
            ProjectError::InvalidOperation(format!(
                "ordinal {} does not belong to any library kind",
                library.ordinal
            ))
        })?;
        let root_name = self
            .catalog
            .tree()
            .get(self.catalog.root())
            .map(|node| node.name.clone())
            .unwrap_or_default();

        let mut tree = ProjectTree::new(root_name);
        let root = tree.root();
        self.fill(&mut tree, root, &library.root, kind, library.ordinal)?;
        Ok(tree)
    }

    fn fill(
        &self,
        tree: &mut ProjectTree<ImportItem>,
        parent: ItemKey,
        folder: &LibraryFolder,
        kind: LibraryKind,
        ordinal: u32,
    ) -> ProjectResult<()> {
        for child in &folder.folders {
            let key = match tree.find_child(parent, &child.name) {
                Some(existing) if tree.is_folder(existing) => existing,
                _ => tree.insert_folder(parent, &child.name)?,
            };
            self.fill(tree, key, child, kind, ordinal)?;
        }
        for asset in &folder.assets {
            let Some(candidate) = self.classify(asset, kind, ordinal)? else {
                continue;
            };
            let (desired, ext, item) = candidate;
            let name = unique_name(&desired, tree.sibling_names(parent, &ext));
            tree.insert_leaf(parent, &name, &ext, item)?;
        }
        Ok(())
    }

    fn classify(
        &self,
        asset: &LibraryAsset,
        kind: LibraryKind,
        ordinal: u32,
    ) -> ProjectResult<Option<(String, String, ImportItem)>> {
        let Some(object) = &asset.object else {
            return Ok(None);
        };
        let Some(type_guid) = self.types.to_guid(&object.asset_type) else {
            log::warn!(
                "ImportReconciler: no guid for type '{}', skipping '{}'.",
                object.asset_type.name,
                asset.name
            );
            return Ok(None);
        };
        let id = compose(kind, ordinal, asset.local_id)?;
        let mut status = ImportStatus::New;

        let mut parts = Vec::with_capacity(asset.parts.len());
        for part in &asset.parts {
            let Some(part_guid) = self.types.to_guid(&part.object.asset_type) else {
                continue;
            };
            let part_id = compose(kind, ordinal, part.local_id)?;
            let parent_id = part
                .parent_local_id
                .map(|local| compose(kind, ordinal, local))
                .transpose()?;
            if let Some(owner) = self.catalog.asset_by_id(part_id) {
                if owner.id != id || owner.type_guid != type_guid {
                    status = ImportStatus::Conflict;
                }
            }
            parts.push(PrefabPart {
                id: part_id,
                parent_id,
                name: part.object.name.clone(),
                type_guid: part_guid,
            });
        }

        let mut name = asset.name.clone();
        if status != ImportStatus::Conflict {
            if let Some((existing_name, existing_guid)) = self.existing(id) {
                if existing_guid == type_guid {
                    status = ImportStatus::Overwrite;
                    name = existing_name;
                } else {
                    status = ImportStatus::Conflict;
                }
            }
        }

        let item = ImportItem {
            id,
            type_guid,
            status,
            preview: None,
            parts,
            object: Some(object.clone()),
        };
        Ok(Some((name, object.asset_type.extension(), item)))
    }

    fn existing(&self, id: AssetId) -> Option<(String, TypeGuid)> {
        let key = self.catalog.key_of(id)?;
        let node = self.catalog.tree().get(key)?;
        let item = node.leaf()?;
        Some((node.name.clone(), item.type_guid))
    }
}
