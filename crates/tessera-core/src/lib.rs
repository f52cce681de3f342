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

//! # Tessera Core
//!
//! Foundational crate containing the identifier space, the project and
//! library data types, and the collaborator contracts that the rest of the
//! workspace builds on.

#![warn(missing_docs)]

pub mod asset;
pub mod error;
pub mod event;
pub mod id;
pub mod library;
pub mod naming;
pub mod project;
pub mod services;

pub use error::{ProjectError, ProjectResult, StorageError};
pub use id::{AssetId, LibraryKind};
