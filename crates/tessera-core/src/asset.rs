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

//! Types describing runtime objects and their persistent representation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::AssetId;

/// A stable identifier for an object type, independent of the host's own
/// type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeGuid(pub Uuid);

impl TypeGuid {
    /// Derives a deterministic guid from a fully qualified type name.
    pub fn from_type_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl fmt::Display for TypeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of object families the project knows how to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// A whole scene.
    Scene,
    /// A composite object made of nested children and components.
    Prefab,
    /// A standalone data object.
    ScriptableObject,
    /// A material.
    Material,
    /// A mesh.
    Mesh,
    /// A shader.
    Shader,
    /// A behaviour attached to a prefab object. Only persisted as a part.
    Component,
    /// Any other persistable resource.
    Other,
}

impl AssetKind {
    /// Picks the persistent representation for this kind, or `None` when
    /// the kind cannot be stored on its own.
    pub fn persistent_kind(self) -> Option<PersistentKind> {
        match self {
            AssetKind::Scene => Some(PersistentKind::Scene),
            AssetKind::Prefab => Some(PersistentKind::RuntimePrefab),
            AssetKind::Component => None,
            AssetKind::ScriptableObject
            | AssetKind::Material
            | AssetKind::Mesh
            | AssetKind::Shader
            | AssetKind::Other => Some(PersistentKind::Object),
        }
    }
}

/// The persistent representation chosen for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistentKind {
    /// Stored as a scene snapshot.
    Scene,
    /// Stored as a prefab with its parts.
    RuntimePrefab,
    /// Stored as a flat object.
    Object,
}

/// A concrete object type: its fully qualified name and family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetType {
    /// Fully qualified type name, e.g. `Engine.Material`.
    pub name: String,
    /// The family the type belongs to.
    pub kind: AssetKind,
}

impl AssetType {
    /// Creates a new asset type.
    pub fn new(name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The unqualified type name (after the last `.`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The file extension used for assets of this type.
    pub fn extension(&self) -> String {
        match self.kind {
            AssetKind::Scene => ".rtscene".to_string(),
            AssetKind::Prefab => ".rtprefab".to_string(),
            AssetKind::ScriptableObject => ".rtasset".to_string(),
            AssetKind::Material => ".rtmat".to_string(),
            AssetKind::Mesh => ".rtmesh".to_string(),
            AssetKind::Shader => ".rtshader".to_string(),
            AssetKind::Component | AssetKind::Other => {
                let prefix: String = self
                    .short_name()
                    .chars()
                    .take(3)
                    .flat_map(char::to_lowercase)
                    .collect();
                format!(".rt{prefix}")
            }
        }
    }
}

/// An opaque handle to a live object owned by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// What the object registry knows about an object living in a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Display name of the object.
    pub name: String,
    /// Concrete type of the object.
    pub asset_type: AssetType,
}

/// A component attached to a live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Handle of the component.
    pub handle: ObjectHandle,
    /// Concrete type of the component.
    pub asset_type: AssetType,
}

/// The shape of a live object: itself, its nested children and their
/// components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Handle of the object.
    pub handle: ObjectHandle,
    /// Display name.
    pub name: String,
    /// Concrete type.
    pub asset_type: AssetType,
    /// Components attached to this object.
    pub components: Vec<ComponentDescriptor>,
    /// Nested child objects, in hierarchy order.
    pub children: Vec<ObjectDescriptor>,
}

/// A captured object, ready to be handed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentObject {
    /// The representation this object was captured as.
    pub kind: PersistentKind,
    /// Display name of the captured object.
    pub name: String,
    /// Concrete type of the captured object.
    pub asset_type: AssetType,
    /// Identifiers of the objects this one references.
    pub dependencies: Vec<AssetId>,
    /// Opaque serialized state, owned by the object factory.
    pub data: Vec<u8>,
}
