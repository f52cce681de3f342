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

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tessera_core::asset::PersistentObject;
use tessera_core::error::StorageError;
use tessera_core::project::{
    AssetBundleInfo, AssetItem, Preview, ProjectInfo, ProjectItemRecord, ROOT_FOLDER,
};
use tessera_core::services::{SaveEntry, Storage};

#[derive(Debug, Clone)]
struct StoredAsset {
    item: AssetItem,
    object: PersistentObject,
}

#[derive(Debug, Clone)]
struct ProjectStore {
    info: ProjectInfo,
    bundles: BTreeMap<String, AssetBundleInfo>,
    folders: BTreeSet<String>,
    assets: BTreeMap<String, StoredAsset>,
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

fn split_name_ext(file: &str) -> (String, String) {
    match file.rfind('.') {
        Some(dot) if dot > 0 => (file[..dot].to_string(), file[dot..].to_string()),
        _ => (file.to_string(), String::new()),
    }
}

fn is_within(path: &str, folder: &str) -> bool {
    path.len() > folder.len() && path.starts_with(folder) && path.as_bytes()[folder.len()] == b'/'
}

impl ProjectStore {
    fn new(name: &str) -> Self {
        Self {
            info: ProjectInfo::new(name),
            bundles: BTreeMap::new(),
            folders: BTreeSet::new(),
            assets: BTreeMap::new(),
        }
    }

    fn is_folder(&self, path: &str) -> bool {
        path == ROOT_FOLDER || self.folders.contains(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.is_folder(path) || self.assets.contains_key(path)
    }

    fn ensure_folders(&mut self, folder_path: &str) -> Result<(), StorageError> {
        let mut segments = folder_path.split('/');
        if segments.next() != Some(ROOT_FOLDER) {
            return Err(StorageError::Failed(format!(
                "'{folder_path}' is outside of '{ROOT_FOLDER}'"
            )));
        }
        let mut current = ROOT_FOLDER.to_string();
        for segment in segments.filter(|s| !s.is_empty()) {
            current = format!("{current}/{segment}");
            if self.assets.contains_key(&current) {
                return Err(StorageError::Failed(format!("'{current}' is not a folder")));
            }
            self.folders.insert(current.clone());
        }
        Ok(())
    }

    fn relocate(&mut self, from: &str, to: &str) {
        if let Some(asset) = self.assets.remove(from) {
            self.assets.insert(to.to_string(), asset);
            return;
        }
        let rebase = |path: &str| format!("{to}{}", &path[from.len()..]);
        let folders: Vec<String> = self
            .folders
            .iter()
            .filter(|f| f.as_str() == from || is_within(f, from))
            .cloned()
            .collect();
        for folder in folders {
            self.folders.remove(&folder);
            self.folders.insert(rebase(&folder));
        }
        let assets: Vec<String> = self
            .assets
            .keys()
            .filter(|a| is_within(a, from))
            .cloned()
            .collect();
        for path in assets {
            if let Some(asset) = self.assets.remove(&path) {
                self.assets.insert(rebase(&path), asset);
            }
        }
    }

    fn remove(&mut self, path: &str) {
        if self.assets.remove(path).is_some() {
            return;
        }
        self.folders.retain(|f| f != path && !is_within(f, path));
        self.assets.retain(|a, _| !is_within(a, path));
    }

    fn record(&self, folder: &str) -> ProjectItemRecord {
        let mut children: Vec<ProjectItemRecord> = self
            .folders
            .iter()
            .filter(|f| parent_of(f) == folder)
            .map(|f| self.record(f))
            .collect();
        children.extend(
            self.assets
                .iter()
                .filter(|(path, _)| parent_of(path) == folder)
                .map(|(path, stored)| {
                    let (name, ext) = split_name_ext(file_name(path));
                    let mut item = stored.item.clone();
                    item.preview = None;
                    ProjectItemRecord::Asset { name, ext, item }
                }),
        );
        ProjectItemRecord::Folder {
            name: file_name(folder).to_string(),
            children,
        }
    }
}

/// A storage backend that keeps every project in memory.
///
/// Projects are flat maps from `/`-separated paths to assets; folders are
/// implied by the paths and tracked separately so empty ones survive. A
/// failure can be injected to exercise error paths, either on the next call
/// or on the next call that writes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    projects: RwLock<BTreeMap<String, ProjectStore>>,
    injected: Mutex<Option<StorageError>>,
    injected_write: Mutex<Option<StorageError>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call fail with `error`.
    pub fn inject_failure(&self, error: StorageError) {
        if let Ok(mut injected) = self.injected.lock() {
            *injected = Some(error);
        }
    }

    /// Makes the next call that writes to a project fail with `error`.
    /// Reads before it go through.
    pub fn inject_write_failure(&self, error: StorageError) {
        if let Ok(mut injected) = self.injected_write.lock() {
            *injected = Some(error);
        }
    }

    /// Paths of every asset stored in `project`.
    pub fn asset_paths(&self, project: &str) -> Vec<String> {
        self.read(project, |store| Ok(store.assets.keys().cloned().collect()))
            .unwrap_or_default()
    }

    /// The stored metadata of the asset at `path`.
    pub fn stored_item(&self, project: &str, path: &str) -> Option<AssetItem> {
        self.read(project, |store| Ok(store.assets.get(path).map(|a| a.item.clone())))
            .ok()
            .flatten()
    }

    fn take_failure(&self) -> Result<(), StorageError> {
        let mut injected = self
            .injected
            .lock()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        match injected.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn read<R>(
        &self,
        project: &str,
        f: impl FnOnce(&ProjectStore) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let projects = self
            .projects
            .read()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        let store = projects
            .get(project)
            .ok_or_else(|| StorageError::NotFound(format!("project '{project}'")))?;
        f(store)
    }

    fn write<R>(
        &self,
        project: &str,
        f: impl FnOnce(&mut ProjectStore) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        if let Some(error) = self
            .injected_write
            .lock()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?
            .take()
        {
            return Err(error);
        }
        let mut projects = self
            .projects
            .write()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        let store = projects
            .get_mut(project)
            .ok_or_else(|| StorageError::NotFound(format!("project '{project}'")))?;
        // Work on a copy so a failing call leaves the project untouched.
        let mut draft = store.clone();
        let result = f(&mut draft)?;
        *store = draft;
        Ok(result)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_project(&self, name: &str) -> Result<ProjectInfo, StorageError> {
        self.take_failure()?;
        let mut projects = self
            .projects
            .write()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        if projects.contains_key(name) {
            return Err(StorageError::Failed(format!("project '{name}' already exists")));
        }
        let store = ProjectStore::new(name);
        let info = store.info.clone();
        projects.insert(name.to_string(), store);
        log::debug!("MemoryStorage: created project '{name}'.");
        Ok(info)
    }

    async fn get_projects(&self) -> Result<Vec<ProjectInfo>, StorageError> {
        self.take_failure()?;
        let projects = self
            .projects
            .read()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        Ok(projects.values().map(|store| store.info.clone()).collect())
    }

    async fn delete_project(&self, name: &str) -> Result<(), StorageError> {
        self.take_failure()?;
        let mut projects = self
            .projects
            .write()
            .map_err(|_| StorageError::Failed("storage lock poisoned".into()))?;
        projects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("project '{name}'")))
    }

    async fn get_project(
        &self,
        name: &str,
    ) -> Result<(ProjectInfo, Vec<AssetBundleInfo>), StorageError> {
        self.take_failure()?;
        self.read(name, |store| {
            Ok((store.info.clone(), store.bundles.values().cloned().collect()))
        })
    }

    async fn get_project_tree(&self, name: &str) -> Result<ProjectItemRecord, StorageError> {
        self.take_failure()?;
        self.read(name, |store| Ok(store.record(ROOT_FOLDER)))
    }

    async fn get_previews(
        &self,
        project: &str,
        folder_path: &str,
    ) -> Result<Vec<Preview>, StorageError> {
        self.take_failure()?;
        self.read(project, |store| {
            if !store.is_folder(folder_path) {
                return Err(StorageError::NotFound(folder_path.to_string()));
            }
            Ok(store
                .assets
                .iter()
                .filter(|(path, _)| parent_of(path) == folder_path)
                .filter_map(|(_, stored)| stored.item.preview.clone())
                .collect())
        })
    }

    async fn save(
        &self,
        project: &str,
        entries: Vec<SaveEntry>,
        info: &ProjectInfo,
    ) -> Result<(), StorageError> {
        self.take_failure()?;
        self.write(project, |store| {
            for entry in entries {
                store.ensure_folders(&entry.folder_path)?;
                let path = entry.path();
                if store.is_folder(&path) {
                    return Err(StorageError::Failed(format!("'{path}' is a folder")));
                }
                store.assets.insert(
                    path,
                    StoredAsset {
                        item: entry.item,
                        object: entry.object,
                    },
                );
            }
            store.info = info.clone();
            Ok(())
        })
    }

    async fn load(
        &self,
        project: &str,
        paths: &[String],
    ) -> Result<Vec<PersistentObject>, StorageError> {
        self.take_failure()?;
        self.read(project, |store| {
            paths
                .iter()
                .map(|path| {
                    store
                        .assets
                        .get(path)
                        .map(|stored| stored.object.clone())
                        .ok_or_else(|| StorageError::NotFound(path.clone()))
                })
                .collect()
        })
    }

    async fn load_bundle_info(
        &self,
        project: &str,
        bundle_name: &str,
    ) -> Result<AssetBundleInfo, StorageError> {
        self.take_failure()?;
        self.read(project, |store| {
            store
                .bundles
                .get(bundle_name)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("bundle info '{bundle_name}'")))
        })
    }

    async fn save_bundle_info(
        &self,
        project: &str,
        bundle: &AssetBundleInfo,
        info: &ProjectInfo,
    ) -> Result<(), StorageError> {
        self.take_failure()?;
        self.write(project, |store| {
            store.bundles.insert(bundle.unique_name.clone(), bundle.clone());
            store.info = info.clone();
            Ok(())
        })
    }

    async fn delete(&self, project: &str, paths: &[String]) -> Result<(), StorageError> {
        self.take_failure()?;
        self.write(project, |store| {
            for path in paths {
                if path == ROOT_FOLDER {
                    return Err(StorageError::Failed("the root folder cannot be deleted".into()));
                }
                store.remove(path);
            }
            Ok(())
        })
    }

    async fn rename(&self, project: &str, path: &str, new_name: &str) -> Result<(), StorageError> {
        self.take_failure()?;
        self.write(project, |store| {
            if !store.exists(path) || path == ROOT_FOLDER {
                return Err(StorageError::NotFound(path.to_string()));
            }
            let target = format!("{}/{new_name}", parent_of(path));
            if target != path && store.exists(&target) {
                return Err(StorageError::Failed(format!("'{target}' already exists")));
            }
            store.relocate(path, &target);
            Ok(())
        })
    }

    async fn move_items(
        &self,
        project: &str,
        paths: &[String],
        target_path: &str,
    ) -> Result<(), StorageError> {
        self.take_failure()?;
        self.write(project, |store| {
            if !store.is_folder(target_path) {
                return Err(StorageError::NotFound(target_path.to_string()));
            }
            for path in paths {
                if !store.exists(path) {
                    return Err(StorageError::NotFound(path.clone()));
                }
                let target = format!("{target_path}/{}", file_name(path));
                if target == *path {
                    continue;
                }
                if store.exists(&target) {
                    return Err(StorageError::Failed(format!("'{target}' already exists")));
                }
                store.relocate(path, &target);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::asset::{AssetKind, AssetType, PersistentKind, TypeGuid};
    use tessera_core::id::AssetId;

    fn entry(folder: &str, file: &str, id: u64) -> SaveEntry {
        let asset_type = AssetType::new("Engine.Material", AssetKind::Material);
        let mut item = AssetItem::new(AssetId::from_raw(id), TypeGuid::from_type_name(&asset_type.name));
        item.preview = Some(Preview {
            item_id: AssetId::from_raw(id),
            data: vec![1, 2, 3],
        });
        SaveEntry {
            folder_path: folder.into(),
            file_name: file.into(),
            item,
            object: PersistentObject {
                kind: PersistentKind::Object,
                name: file.into(),
                asset_type,
                dependencies: Vec::new(),
                data: Vec::new(),
            },
        }
    }

    async fn storage_with_assets() -> MemoryStorage {
        let storage = MemoryStorage::new();
        let info = storage.create_project("demo").await.expect("create");
        storage
            .save(
                "demo",
                vec![
                    entry("Assets/Mats", "Red.rtmat", 1),
                    entry("Assets/Mats/Old", "Blue.rtmat", 2),
                ],
                &info,
            )
            .await
            .expect("save");
        storage
    }

    #[tokio::test]
    async fn test_save_builds_tree_with_folders() {
        let storage = storage_with_assets().await;
        let record = storage.get_project_tree("demo").await.expect("tree");

        let ProjectItemRecord::Folder { name, children } = record else {
            panic!("root must be a folder");
        };
        assert_eq!(name, ROOT_FOLDER);
        let ProjectItemRecord::Folder { name, children } = &children[0] else {
            panic!("expected Mats folder");
        };
        assert_eq!(name, "Mats");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "Old");
        assert_eq!(children[1].name(), "Red");
    }

    #[tokio::test]
    async fn test_previews_are_per_folder() {
        let storage = storage_with_assets().await;
        let previews = storage.get_previews("demo", "Assets/Mats").await.expect("previews");
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].item_id, AssetId::from_raw(1));
    }

    #[tokio::test]
    async fn test_move_and_rename_folder_carry_assets() {
        let storage = storage_with_assets().await;
        storage
            .rename("demo", "Assets/Mats/Old", "Legacy")
            .await
            .expect("rename");
        assert!(storage.stored_item("demo", "Assets/Mats/Legacy/Blue.rtmat").is_some());

        storage
            .move_items("demo", &["Assets/Mats/Legacy".to_string()], "Assets")
            .await
            .expect("move");
        assert!(storage.stored_item("demo", "Assets/Legacy/Blue.rtmat").is_some());
        assert!(storage.stored_item("demo", "Assets/Mats/Legacy/Blue.rtmat").is_none());
    }

    #[tokio::test]
    async fn test_delete_folder_is_recursive() {
        let storage = storage_with_assets().await;
        storage
            .delete("demo", &["Assets/Mats".to_string()])
            .await
            .expect("delete");
        assert!(storage.asset_paths("demo").is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_project_untouched() {
        let storage = storage_with_assets().await;
        storage.inject_failure(StorageError::Failed("disk full".into()));
        let result = storage.delete("demo", &["Assets/Mats".to_string()]).await;
        assert_eq!(result, Err(StorageError::Failed("disk full".into())));
        assert_eq!(storage.asset_paths("demo").len(), 2);
    }

    #[tokio::test]
    async fn test_bundle_info_and_counter_land_together() {
        let storage = storage_with_assets().await;
        let (mut info, _) = storage.get_project("demo").await.expect("project");
        info.bundle_identifier += 1;
        let bundle = AssetBundleInfo::new("props", 128);

        storage.inject_write_failure(StorageError::Failed("disk full".into()));
        let result = storage.save_bundle_info("demo", &bundle, &info).await;
        assert_eq!(result, Err(StorageError::Failed("disk full".into())));
        assert!(storage.load_bundle_info("demo", "props").await.is_err());
        let (stored, _) = storage.get_project("demo").await.expect("project");
        assert_eq!(stored.bundle_identifier, 0);

        storage
            .save_bundle_info("demo", &bundle, &info)
            .await
            .expect("save bundle info");
        let saved = storage.load_bundle_info("demo", "props").await.expect("bundle info");
        assert_eq!(saved.ordinal, 128);
        let (stored, _) = storage.get_project("demo").await.expect("project");
        assert_eq!(stored.bundle_identifier, 1);
    }

    #[tokio::test]
    async fn test_missing_bundle_info_is_not_found() {
        let storage = storage_with_assets().await;
        let result = storage.load_bundle_info("demo", "props").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
