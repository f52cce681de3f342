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

//! Asset libraries and the external bundles they are built from.

use serde::{Deserialize, Serialize};

use crate::asset::{AssetType, ObjectInfo};

/// A nested object or component of a library asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPart {
    /// Local id of the part.
    pub local_id: u32,
    /// Local id of the object the part hangs from.
    pub parent_local_id: Option<u32>,
    /// The part itself.
    pub object: ObjectInfo,
}

/// A top-level asset of a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryAsset {
    /// Display name, without extension.
    pub name: String,
    /// Local id of the asset root.
    pub local_id: u32,
    /// The root object, when the library holds it.
    pub object: Option<ObjectInfo>,
    /// Nested objects and components.
    #[serde(default)]
    pub parts: Vec<LibraryPart>,
}

/// A folder of a library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFolder {
    /// Folder name.
    pub name: String,
    /// Sub-folders.
    #[serde(default)]
    pub folders: Vec<LibraryFolder>,
    /// Assets directly inside this folder.
    #[serde(default)]
    pub assets: Vec<LibraryAsset>,
}

impl LibraryFolder {
    /// Creates an empty folder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folders: Vec::new(),
            assets: Vec::new(),
        }
    }

    /// Returns the sub-folder called `name`, creating it if needed.
    pub fn folder_mut(&mut self, name: &str) -> &mut LibraryFolder {
        let position = match self.folders.iter().position(|f| f.name == name) {
            Some(position) => position,
            None => {
                self.folders.push(LibraryFolder::new(name));
                self.folders.len() - 1
            }
        };
        &mut self.folders[position]
    }
}

/// An asset library addressed by a global ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLibrary {
    /// Global ordinal of the library.
    pub ordinal: u32,
    /// Root folder.
    pub root: LibraryFolder,
}

impl AssetLibrary {
    /// Visits every asset depth-first, with the chain of folder names
    /// leading to it (root excluded).
    pub fn visit_assets<'a>(&'a self, mut visitor: impl FnMut(&[&'a str], &'a LibraryAsset)) {
        fn walk<'a>(
            folder: &'a LibraryFolder,
            path: &mut Vec<&'a str>,
            visitor: &mut dyn FnMut(&[&'a str], &'a LibraryAsset),
        ) {
            for asset in &folder.assets {
                visitor(path, asset);
            }
            for child in &folder.folders {
                path.push(&child.name);
                walk(child, path, visitor);
                path.pop();
            }
        }
        let mut path = Vec::new();
        walk(&self.root, &mut path, &mut visitor);
    }

    /// Number of assets in the library.
    pub fn asset_count(&self) -> usize {
        let mut count = 0;
        self.visit_assets(|_, _| count += 1);
        count
    }
}

/// An object stored in a bundle: a root with nested children and the
/// types of its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleObject {
    /// Object name.
    pub name: String,
    /// Object type.
    pub asset_type: AssetType,
    /// Types of the attached components, in order.
    #[serde(default)]
    pub components: Vec<AssetType>,
    /// Nested children, in order.
    #[serde(default)]
    pub children: Vec<BundleObject>,
}

impl BundleObject {
    /// A leaf object without components or children.
    pub fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            name: name.into(),
            asset_type,
            components: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// An entry of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleAsset {
    /// Path inside the bundle, e.g. `assets/props/crate.prefab`.
    pub path: String,
    /// The stored object.
    pub object: BundleObject,
}

/// An external archive of assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBundle {
    /// Bundle name.
    pub name: String,
    /// Entries, in archive order.
    pub assets: Vec<BundleAsset>,
}
