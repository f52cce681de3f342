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

use std::collections::{BTreeSet, HashSet};

use tessera_core::id::{AssetId, LibraryKind};
use tessera_core::services::TypeMap;
use tessera_data::{AssetCatalog, ItemKey};

/// The outcome of a resolution walk.
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Assets that must be loaded from storage.
    pub to_materialize: HashSet<ItemKey>,
    /// Referenced identifiers the index does not know.
    pub unresolved: HashSet<AssetId>,
    /// Assets skipped because their type cannot be persisted.
    pub excluded: HashSet<ItemKey>,
    visited: HashSet<ItemKey>,
}

impl Resolution {
    /// Returns `true` when every reference was found in the index.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Walks dependency lists depth-first, starting from one asset.
///
/// Assets already bound to a live object (per `is_mapped`) are neither
/// materialized nor traversed. A visited set makes cycles harmless.
pub struct DependencyResolver<'a> {
    catalog: &'a AssetCatalog,
    types: &'a dyn TypeMap,
    is_mapped: &'a dyn Fn(AssetId) -> bool,
}

impl<'a> DependencyResolver<'a> {
    /// Creates a resolver over `catalog`.
    pub fn new(
        catalog: &'a AssetCatalog,
        types: &'a dyn TypeMap,
        is_mapped: &'a dyn Fn(AssetId) -> bool,
    ) -> Self {
        Self {
            catalog,
            types,
            is_mapped,
        }
    }

    /// Resolves the closure of `root`. An unknown root is reported as
    /// unresolved.
    pub fn resolve(&self, root: AssetId) -> Resolution {
        let mut resolution = Resolution::default();
        match self.catalog.key_of(root) {
            Some(key) => self.walk(key, &mut resolution),
            None => {
                resolution.unresolved.insert(root);
            }
        }
        resolution
    }

    /// Continues a previous walk from `ids` only, typically the formerly
    /// unresolved identifiers once stubs were indexed for them. Ids that are
    /// now indexed leave the unresolved set.
    pub fn resolve_pending(
        &self,
        resolution: &mut Resolution,
        ids: impl IntoIterator<Item = AssetId>,
    ) {
        for id in ids {
            if let Some(key) = self.catalog.key_of(id) {
                resolution.unresolved.remove(&id);
                self.walk(key, resolution);
            }
        }
    }

    fn walk(&self, start: ItemKey, resolution: &mut Resolution) {
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            if !resolution.visited.insert(key) {
                continue;
            }
            let Some(item) = self.catalog.asset(key) else {
                continue;
            };
            let persistable = self
                .types
                .to_type(item.type_guid)
                .and_then(|ty| self.types.to_persistent_type(&ty))
                .is_some();
            if !persistable {
                log::warn!(
                    "DependencyResolver: unable to resolve type {} of asset {}, skipping it.",
                    item.type_guid,
                    item.id
                );
                resolution.excluded.insert(key);
                continue;
            }
            if (self.is_mapped)(item.id) {
                continue;
            }
            resolution.to_materialize.insert(key);
            for dependency in &item.dependencies {
                match self.catalog.key_of(*dependency) {
                    Some(dependency_key) => stack.push(dependency_key),
                    None => {
                        resolution.unresolved.insert(*dependency);
                    }
                }
            }
        }
    }
}

/// Ordinals of the libraries owning `ids` that are not loaded yet.
///
/// Dynamic ids are never backed by a library and are skipped, as are ids
/// outside the identifier space.
pub fn libraries_for<'i>(
    ids: impl IntoIterator<Item = &'i AssetId>,
    is_loaded: impl Fn(u32) -> bool,
) -> BTreeSet<u32> {
    ids.into_iter()
        .filter(|id| matches!(id.kind(), Some(kind) if kind != LibraryKind::Dynamic))
        .map(|id| id.ordinal())
        .filter(|ordinal| !is_loaded(*ordinal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::asset::{AssetKind, AssetType, PersistentKind, TypeGuid};
    use tessera_core::id::compose;
    use tessera_core::project::AssetItem;

    struct Types;

    impl TypeMap for Types {
        fn to_type(&self, guid: TypeGuid) -> Option<AssetType> {
            [
                AssetType::new("Engine.GameObject", AssetKind::Prefab),
                AssetType::new("Engine.Material", AssetKind::Material),
            ]
            .into_iter()
            .find(|ty| TypeGuid::from_type_name(&ty.name) == guid)
        }

        fn to_guid(&self, asset_type: &AssetType) -> Option<TypeGuid> {
            Some(TypeGuid::from_type_name(&asset_type.name))
        }

        fn to_persistent_type(&self, asset_type: &AssetType) -> Option<PersistentKind> {
            asset_type.kind.persistent_kind()
        }
    }

    fn dynamic(local: u32) -> AssetId {
        compose(LibraryKind::Dynamic, LibraryKind::Dynamic.bounds().first_ordinal, local)
            .expect("valid id")
    }

    fn item(id: AssetId, type_name: &str, deps: &[AssetId]) -> AssetItem {
        let mut item = AssetItem::new(id, TypeGuid::from_type_name(type_name));
        item.dependencies = deps.to_vec();
        item
    }

    fn not_mapped(_: AssetId) -> bool {
        false
    }

    #[test]
    fn test_cycle_terminates_with_each_asset_once() {
        let (a, b) = (dynamic(100), dynamic(200));
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let ka = catalog
            .insert_asset(root, "A", ".rtprefab", item(a, "Engine.GameObject", &[b]))
            .expect("insert");
        let kb = catalog
            .insert_asset(root, "B", ".rtmat", item(b, "Engine.Material", &[a]))
            .expect("insert");

        let resolver = DependencyResolver::new(&catalog, &Types, &not_mapped);
        let resolution = resolver.resolve(a);

        assert_eq!(resolution.to_materialize, HashSet::from([ka, kb]));
        assert!(resolution.is_complete());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (a, b, c) = (dynamic(1), dynamic(2), dynamic(3));
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        catalog
            .insert_asset(root, "A", ".rtprefab", item(a, "Engine.GameObject", &[b, c]))
            .expect("insert");
        catalog
            .insert_asset(root, "B", ".rtmat", item(b, "Engine.Material", &[]))
            .expect("insert");

        let resolver = DependencyResolver::new(&catalog, &Types, &not_mapped);
        let first = resolver.resolve(a);
        let second = resolver.resolve(a);
        assert_eq!(first.to_materialize, second.to_materialize);
        assert_eq!(first.unresolved, HashSet::from([c]));
    }

    #[test]
    fn test_mapped_assets_are_not_materialized() {
        let (a, b) = (dynamic(1), dynamic(2));
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let ka = catalog
            .insert_asset(root, "A", ".rtprefab", item(a, "Engine.GameObject", &[b]))
            .expect("insert");
        catalog
            .insert_asset(root, "B", ".rtmat", item(b, "Engine.Material", &[]))
            .expect("insert");

        let b_is_live = move |id: AssetId| id == b;
        let resolver = DependencyResolver::new(&catalog, &Types, &b_is_live);
        assert_eq!(resolver.resolve(a).to_materialize, HashSet::from([ka]));
    }

    #[test]
    fn test_unknown_type_excludes_subtree() {
        let (a, b, c) = (dynamic(1), dynamic(2), dynamic(3));
        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let ka = catalog
            .insert_asset(root, "A", ".rtprefab", item(a, "Engine.GameObject", &[b]))
            .expect("insert");
        let kb = catalog
            .insert_asset(root, "B", ".rtfoo", item(b, "Game.Unknown", &[c]))
            .expect("insert");
        catalog
            .insert_asset(root, "C", ".rtmat", item(c, "Engine.Material", &[]))
            .expect("insert");

        let resolver = DependencyResolver::new(&catalog, &Types, &not_mapped);
        let resolution = resolver.resolve(a);
        assert_eq!(resolution.to_materialize, HashSet::from([ka]));
        assert_eq!(resolution.excluded, HashSet::from([kb]));
    }

    #[test]
    fn test_pending_pass_after_library_load() {
        let library = 3;
        let a = dynamic(100);
        let b = compose(LibraryKind::Static, library, 200).expect("valid id");

        let mut catalog = AssetCatalog::new("Assets");
        let root = catalog.root();
        let ka = catalog
            .insert_asset(root, "A", ".rtprefab", item(a, "Engine.GameObject", &[b]))
            .expect("insert");

        let mut resolution = {
            let resolver = DependencyResolver::new(&catalog, &Types, &not_mapped);
            resolver.resolve(a)
        };
        assert_eq!(resolution.unresolved, HashSet::from([b]));
        assert_eq!(
            libraries_for(&resolution.unresolved, |_| false),
            BTreeSet::from([library])
        );

        // The library got loaded and a stub for B was indexed.
        let kb = catalog.insert_stub("B", ".rtmat", item(b, "Engine.Material", &[]));
        let pending: Vec<AssetId> = resolution.unresolved.iter().copied().collect();
        let resolver = DependencyResolver::new(&catalog, &Types, &not_mapped);
        resolver.resolve_pending(&mut resolution, pending);

        assert_eq!(resolution.to_materialize, HashSet::from([ka, kb]));
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn test_libraries_for_skips_dynamic_and_loaded() {
        let ids = [
            dynamic(5),
            compose(LibraryKind::Static, 1, 0).expect("valid"),
            compose(LibraryKind::Static, 2, 0).expect("valid"),
            compose(LibraryKind::Bundled, 130, 4).expect("valid"),
        ];
        let ordinals = libraries_for(&ids, |ordinal| ordinal == 2);
        assert_eq!(ordinals, BTreeSet::from([1, 130]));
    }
}
