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

use crate::asset::{AssetType, ObjectDescriptor, ObjectHandle, PersistentKind, PersistentObject};
use crate::error::ProjectResult;

/// Creates, inspects and serializes live objects on behalf of the project.
pub trait ObjectFactory: Send + Sync {
    /// Describes the hierarchy of a live object.
    fn describe(&self, handle: ObjectHandle) -> Option<ObjectDescriptor>;

    /// Captures the state of a live object as `kind`.
    ///
    /// Dependencies are reported as identifiers, so every referenced object
    /// must already be mapped in the registry.
    fn capture(&self, handle: ObjectHandle, kind: PersistentKind) -> ProjectResult<PersistentObject>;

    /// Creates an empty object of the given type.
    fn instantiate(&self, asset_type: &AssetType) -> ProjectResult<ObjectHandle>;

    /// Applies captured state to an existing object.
    fn write_to(&self, object: &PersistentObject, target: ObjectHandle) -> ProjectResult<()>;

    /// Replaces the active scene with the captured one and returns its root.
    fn write_scene(&self, object: &PersistentObject) -> ProjectResult<ObjectHandle>;

    /// Empties the active scene.
    fn clear_scene(&self);

    /// Destroys a live object.
    fn destroy(&self, handle: ObjectHandle);
}
