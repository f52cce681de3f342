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

//! Items of a project: assets, prefab parts, import candidates and the
//! persisted descriptors that keep identifiers stable.

use serde::{Deserialize, Serialize};

use crate::asset::{ObjectInfo, TypeGuid};
use crate::id::AssetId;

/// Name of the root folder of every project tree.
pub const ROOT_FOLDER: &str = "Assets";

/// A sub-object (nested child or attached component) of a composite asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefabPart {
    /// Identifier of the part itself.
    pub id: AssetId,
    /// Identifier of the object this part hangs from.
    pub parent_id: Option<AssetId>,
    /// Display name.
    pub name: String,
    /// Type of the part.
    pub type_guid: TypeGuid,
}

/// A thumbnail attached to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// The asset this preview belongs to.
    pub item_id: AssetId,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// Metadata of an asset leaf in the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItem {
    /// Identifier of the asset root object.
    pub id: AssetId,
    /// Type of the asset root object.
    pub type_guid: TypeGuid,
    /// Optional thumbnail.
    #[serde(default)]
    pub preview: Option<Preview>,
    /// Identifiers the asset references.
    #[serde(default)]
    pub dependencies: Vec<AssetId>,
    /// Sub-objects of a composite asset.
    #[serde(default)]
    pub parts: Vec<PrefabPart>,
}

impl AssetItem {
    /// Creates an asset item with no preview, dependencies or parts.
    pub fn new(id: AssetId, type_guid: TypeGuid) -> Self {
        Self {
            id,
            type_guid,
            preview: None,
            dependencies: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// The root id followed by every part id.
    pub fn all_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        std::iter::once(self.id).chain(self.parts.iter().map(|part| part.id))
    }
}

/// Classification of an import candidate against the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportStatus {
    /// Nothing in the project uses this identifier yet.
    New,
    /// The identifier exists with the same type and will be replaced.
    Overwrite,
    /// The identifier, or one of its parts, collides with something else.
    Conflict,
}

/// A candidate found while scanning a library, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    /// Proposed identifier, derived from the scanned path.
    pub id: AssetId,
    /// Type of the candidate.
    pub type_guid: TypeGuid,
    /// Classification against the current project.
    pub status: ImportStatus,
    /// Thumbnail to store with the asset.
    pub preview: Option<Preview>,
    /// Sub-objects of a composite candidate.
    pub parts: Vec<PrefabPart>,
    /// The scanned object, released by `unload_import_items`.
    pub object: Option<ObjectInfo>,
}

/// Per-project counters persisted by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project name.
    pub name: String,
    /// Next value of the dynamic identifier counter.
    pub asset_identifier: u64,
    /// Number of bundle libraries created so far.
    pub bundle_identifier: u32,
}

impl ProjectInfo {
    /// A fresh project with both counters at zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asset_identifier: 0,
            bundle_identifier: 0,
        }
    }
}

/// One scanned path of a bundle and the local id it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBundleItemInfo {
    /// Scanned path, e.g. `assets/props/crate.prefab/Lid###`.
    pub path: String,
    /// Local id assigned to the path.
    pub id: u32,
    /// Local id of the owning path, for nested entries.
    pub parent_id: Option<u32>,
}

/// The descriptor of a bundle library: its ordinal and its stable
/// path → local id table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBundleInfo {
    /// Bundle name, unique within the project.
    pub unique_name: String,
    /// Global ordinal of the library.
    pub ordinal: u32,
    /// Next local id. Only ever grows.
    pub identifier: u32,
    /// Every path seen so far.
    pub items: Vec<AssetBundleItemInfo>,
}

impl AssetBundleInfo {
    /// A descriptor with an empty path table.
    pub fn new(unique_name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            unique_name: unique_name.into(),
            ordinal,
            identifier: 0,
            items: Vec::new(),
        }
    }
}

/// Snapshot of a project tree as persisted by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectItemRecord {
    /// A folder with its children.
    Folder {
        /// Folder name.
        name: String,
        /// Children in order.
        children: Vec<ProjectItemRecord>,
    },
    /// An asset leaf.
    Asset {
        /// Name without extension.
        name: String,
        /// Extension, including the leading dot.
        ext: String,
        /// Asset metadata.
        item: AssetItem,
    },
}

impl ProjectItemRecord {
    /// Name of the record.
    pub fn name(&self) -> &str {
        match self {
            ProjectItemRecord::Folder { name, .. } | ProjectItemRecord::Asset { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ids_starts_with_root() {
        let guid = TypeGuid::from_type_name("Engine.GameObject");
        let mut item = AssetItem::new(AssetId::from_raw(7), guid);
        item.parts.push(PrefabPart {
            id: AssetId::from_raw(8),
            parent_id: Some(AssetId::from_raw(7)),
            name: "Lid".into(),
            type_guid: guid,
        });

        let ids: Vec<_> = item.all_ids().collect();
        assert_eq!(ids, vec![AssetId::from_raw(7), AssetId::from_raw(8)]);
    }

    #[test]
    fn test_record_serde_defaults() {
        let json = r#"{"Asset":{"name":"Crate","ext":".rtprefab",
            "item":{"id":5,"type_guid":"00000000-0000-0000-0000-000000000000"}}}"#;
        let record: ProjectItemRecord = serde_json::from_str(json).expect("valid record");
        match record {
            ProjectItemRecord::Asset { item, .. } => {
                assert!(item.parts.is_empty());
                assert!(item.dependencies.is_empty());
                assert_eq!(item.id, AssetId::from_raw(5));
            }
            other => panic!("unexpected record {other:?}"),
        }
    }
}
