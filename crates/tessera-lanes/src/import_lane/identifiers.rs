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

use std::collections::HashMap;

use tessera_core::asset::AssetKind;
use tessera_core::error::ProjectResult;
use tessera_core::id::{next_local_id, LibraryKind};
use tessera_core::library::{AssetBundle, BundleObject};
use tessera_core::project::{AssetBundleInfo, AssetBundleItemInfo};

/// Separates a child name from its occurrence number in scanned paths.
pub const CHILD_MARKER: &str = "###";

/// Path of the `occurrence`-th child called `name` under `parent_path`.
///
/// The first occurrence is `parent/name###`, later ones `parent/name###N`
/// with `N >= 2`. Identity is positional: reordering same-named children
/// swaps their identifiers.
pub fn child_path(parent_path: &str, name: &str, occurrence: u32) -> String {
    if occurrence <= 1 {
        format!("{parent_path}/{name}{CHILD_MARKER}")
    } else {
        format!("{parent_path}/{name}{CHILD_MARKER}{occurrence}")
    }
}

/// Path of a component of type `type_name` under `owner_path`. Only the
/// first component of each type gets an identifier.
pub fn component_path(owner_path: &str, type_name: &str) -> String {
    format!("{owner_path}/{type_name}")
}

struct PathTable {
    info: AssetBundleInfo,
    positions: HashMap<String, usize>,
    kind: LibraryKind,
    added: usize,
}

impl PathTable {
    fn new(info: &AssetBundleInfo) -> Self {
        let positions = info
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.path.clone(), i))
            .collect();
        Self {
            info: info.clone(),
            positions,
            kind: LibraryKind::of_ordinal(info.ordinal).unwrap_or(LibraryKind::Bundled),
            added: 0,
        }
    }

    fn ensure(&mut self, path: String, parent_id: Option<u32>) -> ProjectResult<u32> {
        if let Some(position) = self.positions.get(&path) {
            return Ok(self.info.items[*position].id);
        }
        let id = next_local_id(&mut self.info.identifier, self.kind)?;
        self.positions.insert(path.clone(), self.info.items.len());
        self.info.items.push(AssetBundleItemInfo {
            path,
            id,
            parent_id,
        });
        self.added += 1;
        Ok(id)
    }

    fn prefab(&mut self, path: &str, object: &BundleObject, id: u32) -> ProjectResult<()> {
        for component in &object.components {
            self.ensure(component_path(path, &component.name), Some(id))?;
        }
        let mut occurrences: HashMap<&str, u32> = HashMap::new();
        for child in &object.children {
            let occurrence = occurrences.entry(child.name.as_str()).or_insert(0);
            *occurrence += 1;
            let path = child_path(path, &child.name, *occurrence);
            let child_id = self.ensure(path.clone(), Some(id))?;
            self.prefab(&path, child, child_id)?;
        }
        Ok(())
    }
}

/// Extends the path → local id table of `info` with every path of
/// `bundle`. Existing entries are never rewritten, so re-scanning a bundle
/// yields the same identifiers.
///
/// ## Returns
/// The number of paths that received a new local id.
///
/// ## Errors
/// `IdentifierSpaceExhausted` when the library runs out of local ids; `info`
/// is left exactly as it was.
pub fn generate_identifiers(bundle: &AssetBundle, info: &mut AssetBundleInfo) -> ProjectResult<usize> {
    let mut table = PathTable::new(info);
    for asset in &bundle.assets {
        let id = table.ensure(asset.path.clone(), None)?;
        if asset.object.asset_type.kind == AssetKind::Prefab {
            table.prefab(&asset.path, &asset.object, id)?;
        }
    }
    log::debug!(
        "Bundle '{}': {} new identifier(s), next local id {}.",
        bundle.name,
        table.added,
        table.info.identifier
    );
    let added = table.added;
    *info = table.info;
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::asset::AssetType;
    use tessera_core::error::ProjectError;
    use tessera_core::id::MAX_LOCAL_ID;
    use tessera_core::library::BundleAsset;

    fn prefab_bundle(children: &[&str]) -> AssetBundle {
        let mut root = BundleObject::new("Crate", AssetType::new("Engine.GameObject", AssetKind::Prefab));
        root.components
            .push(AssetType::new("Engine.Transform", AssetKind::Component));
        root.components
            .push(AssetType::new("Engine.Transform", AssetKind::Component));
        for name in children {
            root.children.push(BundleObject::new(
                *name,
                AssetType::new("Engine.GameObject", AssetKind::Prefab),
            ));
        }
        AssetBundle {
            name: "props".into(),
            assets: vec![
                BundleAsset {
                    path: "assets/props/crate.prefab".into(),
                    object: root,
                },
                BundleAsset {
                    path: "assets/props/red.mat".into(),
                    object: BundleObject::new("red", AssetType::new("Engine.Material", AssetKind::Material)),
                },
            ],
        }
    }

    fn paths(info: &AssetBundleInfo) -> Vec<&str> {
        info.items.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_paths_and_parents() {
        let mut info = AssetBundleInfo::new("props", 128);
        let added = generate_identifiers(&prefab_bundle(&["Lid", "Nail", "Nail", "Nail"]), &mut info)
            .expect("generate");

        assert_eq!(
            paths(&info),
            vec![
                "assets/props/crate.prefab",
                "assets/props/crate.prefab/Engine.Transform",
                "assets/props/crate.prefab/Lid###",
                "assets/props/crate.prefab/Nail###",
                "assets/props/crate.prefab/Nail###2",
                "assets/props/crate.prefab/Nail###3",
                "assets/props/red.mat",
            ]
        );
        assert_eq!(added, 7);
        assert_eq!(info.identifier, 7);
        let root_id = info.items[0].id;
        assert!(info.items[1..6].iter().all(|i| i.parent_id == Some(root_id)));
        assert_eq!(info.items[6].parent_id, None);
    }

    #[test]
    fn test_rescan_keeps_identifiers() {
        let mut info = AssetBundleInfo::new("props", 128);
        generate_identifiers(&prefab_bundle(&["Lid"]), &mut info).expect("first scan");
        let before = info.clone();

        let added = generate_identifiers(&prefab_bundle(&["Lid", "Nail"]), &mut info)
            .expect("second scan");
        assert_eq!(added, 1);
        assert_eq!(&info.items[..before.items.len()], &before.items[..]);
        let nail = info.items.last().expect("new entry");
        assert_eq!(nail.path, "assets/props/crate.prefab/Nail###");
        assert_eq!(nail.id, before.identifier);
    }

    #[test]
    fn test_nested_children_hang_from_their_parent() {
        let mut lid = BundleObject::new("Lid", AssetType::new("Engine.GameObject", AssetKind::Prefab));
        lid.children
            .push(BundleObject::new("Handle", AssetType::new("Engine.GameObject", AssetKind::Prefab)));
        let mut bundle = prefab_bundle(&[]);
        bundle.assets[0].object.children.push(lid);

        let mut info = AssetBundleInfo::new("props", 128);
        generate_identifiers(&bundle, &mut info).expect("generate");

        let lid_id = info
            .items
            .iter()
            .find(|i| i.path.ends_with("/Lid###"))
            .map(|i| i.id)
            .expect("lid");
        let handle = info
            .items
            .iter()
            .find(|i| i.path == "assets/props/crate.prefab/Lid###/Handle###")
            .expect("handle");
        assert_eq!(handle.parent_id, Some(lid_id));
    }

    #[test]
    fn test_exhaustion_leaves_info_untouched() {
        let mut info = AssetBundleInfo::new("props", 128);
        info.identifier = MAX_LOCAL_ID;
        let before = info.clone();

        let result = generate_identifiers(&prefab_bundle(&["Lid"]), &mut info);
        assert_eq!(
            result,
            Err(ProjectError::IdentifierSpaceExhausted {
                kind: LibraryKind::Bundled
            })
        );
        assert_eq!(info, before);
    }
}
