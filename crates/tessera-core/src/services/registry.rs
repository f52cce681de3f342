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

use async_trait::async_trait;

use crate::asset::{ObjectHandle, ObjectInfo};
use crate::id::AssetId;
use crate::library::AssetLibrary;

/// Maps identifiers to live objects and tracks which libraries are loaded.
#[async_trait]
pub trait ObjectRegistry: Send + Sync {
    /// Returns `true` if `id` is bound to a live object.
    fn is_mapped(&self, id: AssetId) -> bool;

    /// The live object bound to `id`.
    fn from_id(&self, id: AssetId) -> Option<ObjectHandle>;

    /// The identifier bound to a live object.
    fn to_id(&self, handle: ObjectHandle) -> Option<AssetId>;

    /// Name and type of the object bound to `id`.
    fn describe(&self, id: AssetId) -> Option<ObjectInfo>;

    /// Binds runtime-created objects to dynamic identifiers.
    fn register_dynamic_resources(&self, resources: &[(AssetId, ObjectHandle)]);

    /// Drops every dynamic binding.
    fn unregister_dynamic_resources(&self);

    /// Returns `true` if the library with `ordinal` is loaded.
    fn is_library_loaded(&self, ordinal: u32) -> bool;

    /// Loads a static or scene library by name and binds it to `ordinal`.
    ///
    /// # Returns
    ///
    /// `false` if the library does not exist.
    async fn load_library(&self, name: &str, ordinal: u32) -> bool;

    /// Reads a static library by name without binding it.
    async fn fetch_library(&self, name: &str) -> Option<AssetLibrary>;

    /// Binds the objects of an in-memory library under its ordinal.
    ///
    /// # Returns
    ///
    /// `false` if the ordinal is already bound.
    fn add_library(&self, library: &AssetLibrary) -> bool;

    /// Unbinds one library.
    fn unload_library(&self, ordinal: u32);

    /// Unbinds every library.
    fn unload_libraries(&self);
}
