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

//! # Tessera Agents
//!
//! The stateful drivers of the project layer. The [`LibraryAgent`] decides
//! how each library ordinal is loaded and joins batches of loads; the
//! [`ProjectAgent`] owns the open project and exposes every asynchronous
//! entry point, guarded so only one operation runs at a time.

#![warn(missing_docs)]

pub mod config;
pub mod library_agent;
pub mod project_agent;

pub use config::ProjectConfig;
pub use library_agent::{LibraryAgent, LoadReport};
pub use project_agent::{ProjectAgent, ProjectServices, SessionState};
