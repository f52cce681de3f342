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

// Tessera Sandbox
// Drives a project session against the in-memory collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tessera_agents::{ProjectAgent, ProjectConfig, ProjectServices};
use tessera_core::library::{AssetBundle, BundleAsset, BundleObject};
use tessera_core::project::Preview;
use tessera_io::{MemoryBundleLoader, MemoryRuntime, MemoryStorage, TypeTable};

#[derive(Parser, Debug)]
#[command(name = "sandbox", about = "Project session walkthrough", version)]
struct Cli {
    /// Project configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Name of the project to create.
    #[arg(long, default_value = "sandbox")]
    project: String,
}

fn sample_bundle(types: &TypeTable) -> Result<AssetBundle> {
    let ty = |name: &str| {
        types
            .get(name)
            .cloned()
            .with_context(|| format!("type '{name}' is not registered"))
    };
    let mut barrel = BundleObject::new("Barrel", ty("Engine.Prefab")?);
    barrel.components.push(ty("Engine.Transform")?);
    barrel.children.push(BundleObject::new("Hoop", ty("Engine.Prefab")?));
    barrel.children.push(BundleObject::new("Hoop", ty("Engine.Prefab")?));
    Ok(AssetBundle {
        name: "props".into(),
        assets: vec![
            BundleAsset {
                path: "assets/props/barrel.prefab".into(),
                object: barrel,
            },
            BundleAsset {
                path: "assets/props/oak.mat".into(),
                object: BundleObject::new("Oak", ty("Engine.Material")?),
            },
        ],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    let types = Arc::new(TypeTable::with_engine_types());
    let runtime = Arc::new(MemoryRuntime::new());
    let bundles = Arc::new(MemoryBundleLoader::new());
    bundles.insert(sample_bundle(&types)?);

    let agent = ProjectAgent::new(
        ProjectServices {
            storage: Arc::new(MemoryStorage::new()),
            registry: runtime.clone(),
            factory: runtime.clone(),
            types: types.clone(),
            bundles,
        },
        config,
    );
    let events = agent.subscribe();

    agent.create_project(&cli.project).await?;
    agent.open_project(&cli.project).await?;
    let root = agent.catalog().await.context("project is not open")?.root();

    let crate_type = types.get("Engine.Prefab").cloned().context("missing prefab type")?;
    let handle = runtime.spawn("Crate", crate_type);
    if let Some(transform) = types.get("Engine.Transform").cloned() {
        runtime.add_component(handle, transform);
    }
    let crate_id = agent.create(root, Some(vec![0xff]), handle, None).await?;
    log::info!("Sandbox: created crate {crate_id}.");

    agent.unload().await?;
    let key = agent
        .catalog()
        .await
        .and_then(|catalog| catalog.key_of(crate_id))
        .context("crate is not indexed")?;
    let reloaded = agent.load(key).await?;
    log::info!("Sandbox: crate reloaded as object {}.", reloaded.0);

    for name in agent.get_asset_bundles().await? {
        let mut tree = agent.load_import_items(&name, false).await?;
        let leaves = tree.leaves(tree.root());
        for leaf in &leaves {
            if let Some(item) = tree.leaf_mut(*leaf) {
                item.preview = Some(Preview {
                    item_id: item.id,
                    data: vec![0],
                });
            }
        }
        let imported = agent.import(&tree, &leaves).await?;
        log::info!("Sandbox: imported {} asset(s) from '{name}'.", imported.len());
        agent.unload_import_items(&mut tree).await?;
    }

    agent.close_project().await?;
    for event in events.try_iter() {
        match &event.error {
            None => log::info!("Sandbox: {:?}", event.payload),
            Some(e) => log::warn!("Sandbox: {:?} failed: {e}", event.payload),
        }
    }
    Ok(())
}
