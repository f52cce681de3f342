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

use tessera_core::asset::{AssetType, PersistentKind, TypeGuid};
use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::event::{EventBus, ProjectEvent, ProjectEventPayload};
use tessera_core::project::ProjectInfo;
use tessera_data::AssetCatalog;
use tokio::sync::Mutex;

use super::services::ProjectServices;
use super::session::{Session, SessionState};
use crate::config::ProjectConfig;
use crate::library_agent::LibraryAgent;

pub(super) struct OpenProject {
    pub(super) info: ProjectInfo,
    pub(super) catalog: AssetCatalog,
}

pub(super) struct SessionData {
    pub(super) project: Option<OpenProject>,
    pub(super) libraries: LibraryAgent,
}

pub(super) fn no_project() -> ProjectError {
    ProjectError::InvalidOperation("no project is open".into())
}

/// Drives every project operation against the configured collaborators.
///
/// Only one operation runs at a time: a call made while another is still
/// pending fails right away with `OperationInProgress`. Each completed call
/// is also published to the subscribers of [`ProjectAgent::subscribe`].
pub struct ProjectAgent {
    pub(super) services: ProjectServices,
    pub(super) config: ProjectConfig,
    pub(super) session: Session,
    pub(super) data: Mutex<SessionData>,
    events: EventBus<ProjectEvent>,
}

impl ProjectAgent {
    /// Creates an agent with no open project.
    pub fn new(services: ProjectServices, config: ProjectConfig) -> Self {
        let libraries = LibraryAgent::new(
            services.registry.clone(),
            services.bundles.clone(),
            config.clone(),
        );
        Self {
            services,
            config,
            session: Session::new(),
            data: Mutex::new(SessionData {
                project: None,
                libraries,
            }),
            events: EventBus::new(),
        }
    }

    /// Subscribes to the completion events of every operation.
    pub fn subscribe(&self) -> flume::Receiver<ProjectEvent> {
        self.events.subscribe()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Emergency reset of the session after a fault. The project state is
    /// not repaired.
    pub fn force_reset(&self) {
        self.session.force_reset();
    }

    /// The configuration the agent was created with.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Info of the open project.
    pub async fn project_info(&self) -> Option<ProjectInfo> {
        let data = self.data.lock().await;
        data.project.as_ref().map(|project| project.info.clone())
    }

    /// A copy of the catalog of the open project.
    pub async fn catalog(&self) -> Option<AssetCatalog> {
        let data = self.data.lock().await;
        data.project.as_ref().map(|project| project.catalog.clone())
    }

    /// Publishes the completion event of an operation and hands its result
    /// back.
    pub(super) fn finish<T>(&self, result: ProjectResult<T>, payload: ProjectEventPayload) -> ProjectResult<T> {
        if let Err(e) = &result {
            log::warn!("ProjectAgent: operation failed: {e}");
        }
        let event = ProjectEvent::new(result.as_ref().err().cloned(), payload);
        let delivered = self.events.publish(event);
        log::trace!("ProjectAgent: event delivered to {delivered} subscriber(s).");
        result
    }

    /// Guid and persistent representation of `asset_type`.
    pub(super) fn persistence_of(&self, asset_type: &AssetType) -> ProjectResult<(PersistentKind, TypeGuid)> {
        let types = &self.services.types;
        let guid = types.to_guid(asset_type).ok_or_else(|| {
            ProjectError::TypeResolution(format!("type '{}' is not registered", asset_type.name))
        })?;
        let kind = types.to_persistent_type(asset_type).ok_or_else(|| {
            ProjectError::TypeResolution(format!(
                "type '{}' has no persistent representation",
                asset_type.name
            ))
        })?;
        Ok((kind, guid))
    }

    /// Resolves a type guid to its type and persistent representation.
    pub(super) fn resolve_type(&self, guid: TypeGuid) -> ProjectResult<(AssetType, PersistentKind)> {
        let asset_type = self
            .services
            .types
            .to_type(guid)
            .ok_or_else(|| ProjectError::TypeResolution(format!("unknown type guid {guid}")))?;
        let (kind, _) = self.persistence_of(&asset_type)?;
        Ok((asset_type, kind))
    }

    fn release(&self, data: &mut SessionData) {
        data.libraries.unload_all();
        self.services.registry.unregister_dynamic_resources();
        if let Some(project) = data.project.as_mut() {
            let stubs = project.catalog.remove_stubs();
            log::debug!("ProjectAgent: released libraries and {stubs} stub(s).");
        }
    }

    fn close(&self, data: &mut SessionData) {
        self.release(data);
        self.services.factory.clear_scene();
        data.libraries.reset();
        if let Some(project) = data.project.take() {
            log::info!("ProjectAgent: closed project '{}'.", project.info.name);
        }
    }

    /// Clears the active scene.
    pub async fn create_new_scene(&self) -> ProjectResult<()> {
        let result = {
            let _guard = self.session.enter()?;
            let _data = self.data.lock().await;
            self.services.factory.clear_scene();
            Ok(())
        };
        self.finish(result, ProjectEventPayload::NewSceneCreated)
    }

    /// Creates an empty project in storage. The project is not opened.
    pub async fn create_project(&self, name: &str) -> ProjectResult<ProjectInfo> {
        let result = {
            let _guard = self.session.enter()?;
            self.services
                .storage
                .create_project(name)
                .await
                .map_err(ProjectError::from)
        };
        let payload = ProjectEventPayload::ProjectCreated(result.as_ref().ok().cloned());
        self.finish(result, payload)
    }

    /// Lists the projects known to storage.
    pub async fn get_projects(&self) -> ProjectResult<Vec<ProjectInfo>> {
        let result = {
            let _guard = self.session.enter()?;
            self.services
                .storage
                .get_projects()
                .await
                .map_err(ProjectError::from)
        };
        let payload = ProjectEventPayload::ProjectsListed(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }

    /// Deletes a project, closing it first if it is the open one.
    pub async fn delete_project(&self, name: &str) -> ProjectResult<()> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            if data.project.as_ref().is_some_and(|p| p.info.name == name) {
                self.close(&mut data);
            }
            self.services
                .storage
                .delete_project(name)
                .await
                .map_err(ProjectError::from)
        };
        self.finish(result, ProjectEventPayload::ProjectDeleted(name.to_string()))
    }

    /// Opens a project, releasing whatever the previous one had loaded.
    pub async fn open_project(&self, name: &str) -> ProjectResult<ProjectInfo> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.open_project_in(&mut data, name).await
        };
        let payload = ProjectEventPayload::ProjectOpened(result.as_ref().ok().cloned());
        self.finish(result, payload)
    }

    async fn open_project_in(&self, data: &mut SessionData, name: &str) -> ProjectResult<ProjectInfo> {
        self.close(data);
        let storage = &self.services.storage;
        let (info, bundle_infos) = storage.get_project(name).await?;
        let record = storage.get_project_tree(name).await?;
        let catalog = AssetCatalog::from_record(&record)?;

        log::info!(
            "ProjectAgent: opened project '{}' ({} identifiers, {} bundle(s)).",
            info.name,
            catalog.index().len(),
            bundle_infos.len()
        );
        data.libraries.set_bundle_infos(bundle_infos);
        data.project = Some(OpenProject {
            info: info.clone(),
            catalog,
        });
        Ok(info)
    }

    /// Closes the open project: libraries and dynamic resources are
    /// released and the scene is cleared.
    pub async fn close_project(&self) -> ProjectResult<()> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.close(&mut data);
            Ok(())
        };
        self.finish(result, ProjectEventPayload::ProjectClosed)
    }

    /// Unloads every library, unregisters every dynamic resource and drops
    /// the stubs created while loading. The open project stays open.
    pub async fn unload(&self) -> ProjectResult<()> {
        let result = {
            let _guard = self.session.enter()?;
            let mut data = self.data.lock().await;
            self.release(&mut data);
            Ok(())
        };
        self.finish(result, ProjectEventPayload::Unloaded)
    }

    /// Lists the bundles that can be imported.
    pub async fn get_asset_bundles(&self) -> ProjectResult<Vec<String>> {
        let result = {
            let _guard = self.session.enter()?;
            Ok(self.services.bundles.list_bundles().await)
        };
        let payload = ProjectEventPayload::BundlesListed(result.as_ref().cloned().unwrap_or_default());
        self.finish(result, payload)
    }
}
