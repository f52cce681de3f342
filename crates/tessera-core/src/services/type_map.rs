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

use crate::asset::{AssetType, PersistentKind, TypeGuid};

/// Translates between type guids and concrete types.
pub trait TypeMap: Send + Sync {
    /// The type registered under `guid`.
    fn to_type(&self, guid: TypeGuid) -> Option<AssetType>;

    /// The guid of a registered type.
    fn to_guid(&self, asset_type: &AssetType) -> Option<TypeGuid>;

    /// The persistent representation used for `asset_type`.
    fn to_persistent_type(&self, asset_type: &AssetType) -> Option<PersistentKind>;
}
