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

//! # Tessera Data
//!
//! In-memory layouts of a project: the item tree, the identifier index and
//! the catalog that keeps the two consistent.

#![warn(missing_docs)]

pub mod catalog;
pub mod index;
pub mod tree;

pub use catalog::AssetCatalog;
pub use index::AssetIndex;
pub use tree::{ItemKey, NodeKind, ProjectNode, ProjectTree};
