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

//! # Tessera Lanes
//!
//! Pure strategies over the project catalog: dependency resolution and the
//! scan → identify → reconcile pipeline of imports. Lanes never talk to
//! storage or load anything; agents feed them and act on their results.

#![warn(missing_docs)]

pub mod dependency_lane;
pub mod import_lane;
