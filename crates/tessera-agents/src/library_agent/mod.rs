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

//! Drives library loads for the project session.
//!
//! Each library ordinal is loaded the way its kind demands: static and
//! scene-dependency libraries by name through the object registry, bundled
//! libraries through the bundle loader followed by a library build from the
//! bundle's identifier descriptor. A batch of loads is dispatched together
//! and joined before anything downstream continues.

mod agent;

pub use agent::{LibraryAgent, LoadReport};
