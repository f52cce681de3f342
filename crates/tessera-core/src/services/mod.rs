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

//! Contracts of the collaborators the project session drives.
//!
//! Concrete implementations live outside this crate; `tessera-io` ships
//! in-memory ones.

mod bundle;
mod factory;
mod registry;
mod storage;
mod type_map;

pub use self::bundle::BundleLoader;
pub use self::factory::ObjectFactory;
pub use self::registry::ObjectRegistry;
pub use self::storage::{SaveEntry, Storage};
pub use self::type_map::TypeMap;
