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

//! The project session.
//!
//! [`ProjectAgent`] owns the open project: its info, its catalog (the item
//! tree and the identifier index) and the [`LibraryAgent`](crate::LibraryAgent)
//! that loads libraries on its behalf. Every entry point is asynchronous,
//! claims the session for its whole duration and broadcasts a
//! [`ProjectEvent`](tessera_core::event::ProjectEvent) when it completes.

mod agent;
mod assets;
mod edit;
mod import;
mod services;
mod session;

pub use agent::ProjectAgent;
pub use services::ProjectServices;
pub use session::{BusyGuard, Session, SessionState};
