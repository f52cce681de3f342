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

use async_trait::async_trait;

use crate::asset::PersistentObject;
use crate::error::StorageError;
use crate::project::{AssetBundleInfo, AssetItem, Preview, ProjectInfo, ProjectItemRecord};

/// One asset to write in a [`Storage::save`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    /// Path of the folder holding the asset, e.g. `Assets/Props`.
    pub folder_path: String,
    /// File name, extension included.
    pub file_name: String,
    /// Asset metadata.
    pub item: AssetItem,
    /// Captured state.
    pub object: PersistentObject,
}

impl SaveEntry {
    /// Full path of the entry.
    pub fn path(&self) -> String {
        format!("{}/{}", self.folder_path, self.file_name)
    }
}

/// The persistence backend of a project.
///
/// Every call is a single round-trip returning one error-or-success result.
/// Paths are `/`-separated and start with the project root folder.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Creates an empty project.
    async fn create_project(&self, name: &str) -> Result<ProjectInfo, StorageError>;

    /// Lists every project.
    async fn get_projects(&self) -> Result<Vec<ProjectInfo>, StorageError>;

    /// Deletes a project and everything in it.
    async fn delete_project(&self, name: &str) -> Result<(), StorageError>;

    /// Reads project counters and every bundle descriptor.
    async fn get_project(
        &self,
        name: &str,
    ) -> Result<(ProjectInfo, Vec<AssetBundleInfo>), StorageError>;

    /// Reads the item tree of a project.
    async fn get_project_tree(&self, name: &str) -> Result<ProjectItemRecord, StorageError>;

    /// Reads the previews of every asset directly inside `folder_path`.
    async fn get_previews(
        &self,
        project: &str,
        folder_path: &str,
    ) -> Result<Vec<Preview>, StorageError>;

    /// Writes assets and the updated project counters.
    async fn save(
        &self,
        project: &str,
        entries: Vec<SaveEntry>,
        info: &ProjectInfo,
    ) -> Result<(), StorageError>;

    /// Reads the captured state of the assets at `paths`, in order.
    async fn load(
        &self,
        project: &str,
        paths: &[String],
    ) -> Result<Vec<PersistentObject>, StorageError>;

    /// Reads the descriptor of a bundle library.
    async fn load_bundle_info(
        &self,
        project: &str,
        bundle_name: &str,
    ) -> Result<AssetBundleInfo, StorageError>;

    /// Writes the descriptor of a bundle library together with the project
    /// info, in one call. Either both land or neither does.
    async fn save_bundle_info(
        &self,
        project: &str,
        bundle: &AssetBundleInfo,
        info: &ProjectInfo,
    ) -> Result<(), StorageError>;

    /// Deletes assets or folders.
    async fn delete(&self, project: &str, paths: &[String]) -> Result<(), StorageError>;

    /// Renames the item at `path`. `new_name` carries the extension for assets.
    async fn rename(&self, project: &str, path: &str, new_name: &str) -> Result<(), StorageError>;

    /// Moves items into the folder at `target_path`.
    async fn move_items(
        &self,
        project: &str,
        paths: &[String],
        target_path: &str,
    ) -> Result<(), StorageError>;
}
