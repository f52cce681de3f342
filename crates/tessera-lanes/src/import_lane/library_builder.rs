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

use tessera_core::asset::ObjectInfo;
use tessera_core::library::{AssetBundle, AssetLibrary, BundleObject, LibraryAsset, LibraryFolder, LibraryPart};
use tessera_core::naming::strip_extension;
use tessera_core::project::{AssetBundleInfo, ROOT_FOLDER};

use super::identifiers::CHILD_MARKER;

/// Name of the root folder of libraries built from bundles.
pub const LIBRARY_ROOT: &str = ROOT_FOLDER;

/// Builds the asset library of a scanned bundle from its descriptor.
///
/// The first path segment is the bundle root and is skipped. Segments
/// without a `.` are folders, the first dotted segment is the asset, and
/// anything deeper is a prefab part of that asset. Entries whose object is
/// no longer in the bundle keep their slot with no object.
pub fn build_library(bundle: &AssetBundle, info: &AssetBundleInfo) -> AssetLibrary {
    let objects: HashMap<&str, &BundleObject> = bundle
        .assets
        .iter()
        .map(|asset| (asset.path.as_str(), &asset.object))
        .collect();

    let mut entries: Vec<_> = info.items.iter().collect();
    // Shorter paths first, so assets exist before their parts.
    entries.sort_by_key(|entry| entry.path.len());

    let mut root = LibraryFolder::new(LIBRARY_ROOT);
    for entry in entries {
        let segments: Vec<&str> = entry.path.split('/').collect();
        let mut folder = &mut root;
        let mut position = 1;
        while position < segments.len() && !segments[position].contains('.') {
            folder = folder.folder_mut(segments[position]);
            position += 1;
        }
        if position >= segments.len() {
            continue;
        }

        let asset_name = segments[position];
        if position == segments.len() - 1 {
            let object = objects.get(entry.path.as_str()).map(|object| ObjectInfo {
                name: object.name.clone(),
                asset_type: object.asset_type.clone(),
            });
            if object.is_none() {
                log::warn!("Bundle '{}' no longer contains '{}'.", bundle.name, entry.path);
            }
            folder.assets.push(LibraryAsset {
                name: asset_name.to_string(),
                local_id: entry.id,
                object,
                parts: Vec::new(),
            });
            continue;
        }

        let asset_path = segments[..=position].join("/");
        let Some(asset) = folder.assets.iter_mut().find(|a| a.name == asset_name) else {
            log::warn!("Prefab part '{}' has no owning asset.", entry.path);
            continue;
        };
        let part = objects
            .get(asset_path.as_str())
            .and_then(|prefab| find_part(prefab, &segments[position + 1..]));
        match part {
            Some(object) => asset.parts.push(LibraryPart {
                local_id: entry.id,
                parent_local_id: entry.parent_id,
                object,
            }),
            None => log::warn!("Prefab part '{}' not found in bundle '{}'.", entry.path, bundle.name),
        }
    }

    strip_asset_extensions(&mut root);
    AssetLibrary {
        ordinal: info.ordinal,
        root,
    }
}

/// Follows `segments` (children `Name###N`, then optionally one component
/// type name) from `root`.
pub fn find_part(root: &BundleObject, segments: &[&str]) -> Option<ObjectInfo> {
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        match segment.split_once(CHILD_MARKER) {
            Some((name, occurrence)) => {
                let occurrence: usize = if occurrence.is_empty() {
                    1
                } else {
                    occurrence.parse().ok()?
                };
                current = current
                    .children
                    .iter()
                    .filter(|child| child.name == name)
                    .nth(occurrence.checked_sub(1)?)?;
            }
            None => {
                if i + 1 != segments.len() {
                    return None;
                }
                let component = current.components.iter().find(|c| c.name == *segment)?;
                return Some(ObjectInfo {
                    name: current.name.clone(),
                    asset_type: component.clone(),
                });
            }
        }
    }
    Some(ObjectInfo {
        name: current.name.clone(),
        asset_type: current.asset_type.clone(),
    })
}

fn strip_asset_extensions(folder: &mut LibraryFolder) {
    for asset in &mut folder.assets {
        asset.name = strip_extension(&asset.name).to_string();
    }
    for child in &mut folder.folders {
        strip_asset_extensions(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_lane::generate_identifiers;
    use tessera_core::asset::{AssetKind, AssetType};
    use tessera_core::library::BundleAsset;

    fn bundle() -> AssetBundle {
        let mut crate_obj = BundleObject::new("Crate", AssetType::new("Engine.GameObject", AssetKind::Prefab));
        crate_obj
            .components
            .push(AssetType::new("Engine.Transform", AssetKind::Component));
        for name in ["Nail", "Nail"] {
            crate_obj
                .children
                .push(BundleObject::new(name, AssetType::new("Engine.GameObject", AssetKind::Prefab)));
        }
        AssetBundle {
            name: "props".into(),
            assets: vec![
                BundleAsset {
                    path: "assets/props/wood/crate.prefab".into(),
                    object: crate_obj,
                },
                BundleAsset {
                    path: "assets/red.mat".into(),
                    object: BundleObject::new("red", AssetType::new("Engine.Material", AssetKind::Material)),
                },
            ],
        }
    }

    #[test]
    fn test_folders_assets_and_parts() {
        let bundle = bundle();
        let mut info = AssetBundleInfo::new("props", 130);
        generate_identifiers(&bundle, &mut info).expect("generate");

        let library = build_library(&bundle, &info);
        assert_eq!(library.ordinal, 130);
        assert_eq!(library.root.name, LIBRARY_ROOT);
        assert_eq!(library.root.assets.len(), 1);
        assert_eq!(library.root.assets[0].name, "red");

        let wood = &library.root.folders[0].folders[0];
        assert_eq!(wood.name, "wood");
        let crate_asset = &wood.assets[0];
        assert_eq!(crate_asset.name, "crate");
        assert_eq!(crate_asset.parts.len(), 3);
        assert!(crate_asset
            .parts
            .iter()
            .all(|p| p.parent_local_id == Some(crate_asset.local_id)));
        assert!(crate_asset
            .parts
            .iter()
            .any(|p| p.object.asset_type.kind == AssetKind::Component));
    }

    #[test]
    fn test_missing_object_keeps_slot() {
        let mut bundle = bundle();
        let mut info = AssetBundleInfo::new("props", 130);
        generate_identifiers(&bundle, &mut info).expect("generate");
        bundle.assets.pop();

        let library = build_library(&bundle, &info);
        assert_eq!(library.root.assets[0].object, None);
    }

    #[test]
    fn test_find_part_by_occurrence() {
        let bundle = bundle();
        let root = &bundle.assets[0].object;
        let second = find_part(root, &["Nail###2"]).expect("second nail");
        assert_eq!(second.name, "Nail");
        assert!(find_part(root, &["Nail###3"]).is_none());
        assert!(find_part(root, &["Nail###0"]).is_none());
        let transform = find_part(root, &["Engine.Transform"]).expect("component");
        assert_eq!(transform.asset_type.name, "Engine.Transform");
        assert!(find_part(root, &["Engine.Transform", "Nail###"]).is_none());
    }
}
