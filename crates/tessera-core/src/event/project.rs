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

use crate::asset::ObjectHandle;
use crate::error::ProjectError;
use crate::id::AssetId;
use crate::project::ProjectInfo;

/// The completion broadcast of one project operation.
///
/// `error` is `None` on success. The payload always carries whatever part
/// of the result was produced, even when the operation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectEvent {
    /// The failure, if any.
    pub error: Option<ProjectError>,
    /// The operation that completed and its best-effort result.
    pub payload: ProjectEventPayload,
}

impl ProjectEvent {
    /// Builds an event from an operation outcome.
    pub fn new(error: Option<ProjectError>, payload: ProjectEventPayload) -> Self {
        Self { error, payload }
    }

    /// Returns `true` if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Which operation completed, with its partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEventPayload {
    /// The scene was cleared.
    NewSceneCreated,
    /// A project was created.
    ProjectCreated(Option<ProjectInfo>),
    /// The list of projects was fetched.
    ProjectsListed(Vec<ProjectInfo>),
    /// A project was deleted.
    ProjectDeleted(String),
    /// A project was opened.
    ProjectOpened(Option<ProjectInfo>),
    /// The open project was closed.
    ProjectClosed,
    /// Folder contents and previews were fetched.
    AssetItemsFetched(Vec<AssetId>),
    /// An asset was created.
    AssetCreated(Option<AssetId>),
    /// Assets were saved.
    AssetsSaved(Vec<AssetId>),
    /// An asset and its dependencies were loaded.
    AssetLoaded(Option<ObjectHandle>),
    /// Every loaded library and dynamic resource was released.
    Unloaded,
    /// A library was scanned into import candidates.
    ImportItemsLoaded(usize),
    /// Import candidates were released.
    ImportItemsUnloaded(usize),
    /// Import candidates were committed.
    Imported(Vec<AssetId>),
    /// An item was renamed; carries its new path.
    Renamed(Option<String>),
    /// Items were moved; carries their new paths.
    Moved(Vec<String>),
    /// Items were deleted; carries their former paths.
    Deleted(Vec<String>),
    /// Available bundles were listed.
    BundlesListed(Vec<String>),
}
