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

use std::sync::Arc;

use tessera_core::services::{BundleLoader, ObjectFactory, ObjectRegistry, Storage, TypeMap};

/// The collaborators a [`ProjectAgent`](super::ProjectAgent) talks to.
#[derive(Clone)]
pub struct ProjectServices {
    /// Project persistence.
    pub storage: Arc<dyn Storage>,
    /// Identifier to object bindings and library state.
    pub registry: Arc<dyn ObjectRegistry>,
    /// Object creation and serialization.
    pub factory: Arc<dyn ObjectFactory>,
    /// Type guid translation.
    pub types: Arc<dyn TypeMap>,
    /// External bundles.
    pub bundles: Arc<dyn BundleLoader>,
}
