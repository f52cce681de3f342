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

use std::collections::HashMap;

use tessera_core::asset::{AssetKind, AssetType, PersistentKind, TypeGuid};
use tessera_core::services::TypeMap;

/// Type names the sandbox engine knows about out of the box.
pub const ENGINE_TYPES: &[(&str, AssetKind)] = &[
    ("Engine.Scene", AssetKind::Scene),
    ("Engine.Prefab", AssetKind::Prefab),
    ("Engine.Settings", AssetKind::ScriptableObject),
    ("Engine.Material", AssetKind::Material),
    ("Engine.Mesh", AssetKind::Mesh),
    ("Engine.Shader", AssetKind::Shader),
    ("Engine.Transform", AssetKind::Component),
];

/// A [`TypeMap`] over an explicit set of registered types.
///
/// Guids are derived from the type name, so two tables registering the
/// same name agree on its guid.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    by_guid: HashMap<TypeGuid, AssetType>,
    by_name: HashMap<String, TypeGuid>,
}

impl TypeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding [`ENGINE_TYPES`].
    pub fn with_engine_types() -> Self {
        let mut table = Self::new();
        for (name, kind) in ENGINE_TYPES {
            table.register(AssetType::new(*name, *kind));
        }
        table
    }

    /// Registers a type and returns its guid.
    pub fn register(&mut self, asset_type: AssetType) -> TypeGuid {
        let guid = TypeGuid::from_type_name(&asset_type.name);
        self.by_name.insert(asset_type.name.clone(), guid);
        self.by_guid.insert(guid, asset_type);
        guid
    }

    /// The registered type called `name`.
    pub fn get(&self, name: &str) -> Option<&AssetType> {
        self.by_name.get(name).and_then(|guid| self.by_guid.get(guid))
    }
}

impl TypeMap for TypeTable {
    fn to_type(&self, guid: TypeGuid) -> Option<AssetType> {
        self.by_guid.get(&guid).cloned()
    }

    fn to_guid(&self, asset_type: &AssetType) -> Option<TypeGuid> {
        self.by_name.get(&asset_type.name).copied()
    }

    fn to_persistent_type(&self, asset_type: &AssetType) -> Option<PersistentKind> {
        self.to_guid(asset_type)?;
        asset_type.kind.persistent_kind()
    }
}
