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

//! # Tessera IO
//!
//! In-memory implementations of the project collaborators: storage, the
//! object runtime, the type table and the bundle loader. They back the
//! integration tests and the sandbox demo.

#![warn(missing_docs)]

pub mod bundles;
pub mod runtime;
pub mod storage;
pub mod types;

pub use bundles::MemoryBundleLoader;
pub use runtime::MemoryRuntime;
pub use storage::MemoryStorage;
pub use types::TypeTable;
