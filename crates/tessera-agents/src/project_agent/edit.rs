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

use std::collections::HashSet;

use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::event::ProjectEventPayload;
use tessera_data::ItemKey;

use super::agent::{no_project, ProjectAgent, SessionData};

fn invalid(message: String) -> ProjectError {
    ProjectError::InvalidOperation(message)
}

impl ProjectAgent {
    /// Renames an asset or folder. Assets keep their extension.
    ///
    /// ## Returns
    /// The new path of the item.
    pub async fn rename(&self, item: ItemKey, new_name: &str) -> ProjectResult<String> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.rename_in(&mut data, item, new_name).await
        };
        let payload = ProjectEventPayload::Renamed(result.as_ref().ok().cloned());
        self.finish(result, payload)
    }

    async fn rename_in(&self, data: &mut SessionData, key: ItemKey, new_name: &str) -> ProjectResult<String> {
        let project = data.project.as_mut().ok_or_else(no_project)?;
        let catalog = &project.catalog;
        if key == catalog.root() {
            return Err(invalid("the root folder cannot be renamed".into()));
        }
        if new_name.is_empty() || new_name.contains('/') {
            return Err(invalid(format!("'{new_name}' is not a valid name")));
        }
        let node = catalog
            .tree()
            .get(key)
            .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))?;
        let parent = node
            .parent()
            .ok_or_else(|| invalid(format!("project item {key:?} is not in the project tree")))?;
        let path = catalog
            .path(key)
            .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))?;
        if node.name == new_name {
            return Ok(path);
        }
        let file_name = format!("{new_name}{}", node.ext);
        if catalog.tree().find_child(parent, &file_name).is_some() {
            return Err(invalid(format!("'{file_name}' already exists")));
        }

        self.services
            .storage
            .rename(&project.info.name, &path, &file_name)
            .await?;
        project.catalog.rename(key, new_name)?;
        let renamed = project.catalog.path(key).unwrap_or_default();
        log::info!("ProjectAgent: renamed '{path}' to '{renamed}'.");
        Ok(renamed)
    }

    /// Moves items under another folder. Items already in `target` are left
    /// alone.
    ///
    /// ## Returns
    /// The new paths of the moved items.
    pub async fn move_items(&self, items: &[ItemKey], target: ItemKey) -> ProjectResult<Vec<String>> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.move_items_in(&mut data, items, target).await
        };
        let payload = ProjectEventPayload::Moved(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }

    async fn move_items_in(
        &self,
        data: &mut SessionData,
        items: &[ItemKey],
        target: ItemKey,
    ) -> ProjectResult<Vec<String>> {
        let project = data.project.as_mut().ok_or_else(no_project)?;
        let tree = project.catalog.tree();
        if !tree.is_folder(target) {
            return Err(invalid(format!("{target:?} is not a folder")));
        }
        let target_path = project
            .catalog
            .path(target)
            .ok_or_else(|| ProjectError::NotFound(format!("folder {target:?}")))?;

        let mut moving = Vec::new();
        let mut names = HashSet::new();
        for key in items {
            if *key == project.catalog.root() {
                return Err(invalid("the root folder cannot be moved".into()));
            }
            let node = tree
                .get(*key)
                .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))?;
            if node.parent() == Some(target) {
                continue;
            }
            if tree.descendants(*key).contains(&target) {
                return Err(invalid(format!("cannot move '{}' into itself", node.name)));
            }
            let name_ext = node.name_ext();
            if tree.find_child(target, &name_ext).is_some() || !names.insert(name_ext.clone()) {
                return Err(invalid(format!("'{target_path}/{name_ext}' already exists")));
            }
            let path = project
                .catalog
                .path(*key)
                .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))?;
            moving.push((*key, path));
        }
        if moving.is_empty() {
            return Ok(Vec::new());
        }

        let paths: Vec<String> = moving.iter().map(|(_, path)| path.clone()).collect();
        self.services
            .storage
            .move_items(&project.info.name, &paths, &target_path)
            .await?;

        let mut moved = Vec::with_capacity(moving.len());
        for (key, _) in moving {
            project.catalog.move_to(key, target)?;
            moved.push(project.catalog.path(key).unwrap_or_default());
        }
        log::info!("ProjectAgent: moved {} item(s) to '{target_path}'.", moved.len());
        Ok(moved)
    }

    /// Deletes assets and folders, folders with everything below them.
    /// Every identifier of every deleted asset leaves the index.
    ///
    /// ## Returns
    /// The paths that were deleted.
    pub async fn delete(&self, items: &[ItemKey]) -> ProjectResult<Vec<String>> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.delete_in(&mut data, items).await
        };
        let payload = ProjectEventPayload::Deleted(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }

    async fn delete_in(&self, data: &mut SessionData, items: &[ItemKey]) -> ProjectResult<Vec<String>> {
        let project = data.project.as_mut().ok_or_else(no_project)?;
        let mut targets = Vec::with_capacity(items.len());
        for key in items {
            if *key == project.catalog.root() {
                return Err(invalid("the root folder cannot be deleted".into()));
            }
            if project.catalog.tree().is_detached(*key) {
                return Err(invalid(format!("project item {key:?} is not in the project tree")));
            }
            let path = project
                .catalog
                .path(*key)
                .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))?;
            targets.push((*key, path));
        }
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let paths: Vec<String> = targets.iter().map(|(_, path)| path.clone()).collect();
        self.services
            .storage
            .delete(&project.info.name, &paths)
            .await?;

        let mut removed = 0;
        for (key, _) in targets {
            // Items nested in an already deleted folder are gone by now.
            if project.catalog.tree().contains(key) {
                removed += project.catalog.remove(key)?.len();
            }
        }
        log::info!("ProjectAgent: deleted {} path(s), {removed} asset(s).", paths.len());
        Ok(paths)
    }
}
