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

//! An arena-backed tree of folders and leaves.
//!
//! Nodes are addressed by [`ItemKey`], a slot index plus a generation
//! counter: once a node is removed its key stops resolving, even if the
//! slot is reused. Children are owned by their parent; the parent link is a
//! plain key.

use tessera_core::error::{ProjectError, ProjectResult};
use tessera_core::project::{AssetItem, ProjectItemRecord};

/// A generational handle to a node of a [`ProjectTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    index: u32,
    generation: u32,
}

impl ItemKey {
    /// Slot index of the node.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when the key was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Whether a node is a container or carries a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<L> {
    /// A folder.
    Folder,
    /// A leaf with its payload.
    Leaf(L),
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode<L> {
    /// Name without extension.
    pub name: String,
    /// Extension with its leading dot; empty for folders.
    pub ext: String,
    /// Folder or leaf.
    pub kind: NodeKind<L>,
    parent: Option<ItemKey>,
    children: Vec<ItemKey>,
}

impl<L> ProjectNode<L> {
    /// `name` followed by `ext`.
    pub fn name_ext(&self) -> String {
        format!("{}{}", self.name, self.ext)
    }

    /// Returns `true` for folders.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    /// The leaf payload, if any.
    pub fn leaf(&self) -> Option<&L> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Folder => None,
        }
    }

    /// The parent key; `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<ItemKey> {
        self.parent
    }

    /// Keys of the children, in order.
    pub fn children(&self) -> &[ItemKey] {
        &self.children
    }
}

#[derive(Debug, Clone)]
struct Slot<L> {
    generation: u32,
    node: Option<ProjectNode<L>>,
}

/// A tree of folders and leaves stored in a slot arena.
#[derive(Debug, Clone)]
pub struct ProjectTree<L> {
    slots: Vec<Slot<L>>,
    free: Vec<u32>,
    root: ItemKey,
}

impl<L> ProjectTree<L> {
    /// Creates a tree holding a single root folder.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ItemKey {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(ProjectNode {
            name: root_name.into(),
            ext: String::new(),
            kind: NodeKind::Folder,
            parent: None,
            children: Vec::new(),
        });
        tree
    }

    /// Key of the root folder.
    pub fn root(&self) -> ItemKey {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if the tree only holds its root.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Returns `true` if `key` still resolves.
    pub fn contains(&self, key: ItemKey) -> bool {
        self.get(key).is_some()
    }

    /// The node at `key`.
    pub fn get(&self, key: ItemKey) -> Option<&ProjectNode<L>> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, key: ItemKey) -> Option<&mut ProjectNode<L>> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, key: ItemKey) -> ProjectResult<&ProjectNode<L>> {
        self.get(key)
            .ok_or_else(|| ProjectError::NotFound(format!("project item {key:?}")))
    }

    /// The leaf payload at `key`.
    pub fn leaf(&self, key: ItemKey) -> Option<&L> {
        self.get(key).and_then(ProjectNode::leaf)
    }

    /// Mutable access to the leaf payload at `key`.
    pub fn leaf_mut(&mut self, key: ItemKey) -> Option<&mut L> {
        match &mut self.get_mut(key)?.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Folder => None,
        }
    }

    /// Returns `true` if `key` is a live folder.
    pub fn is_folder(&self, key: ItemKey) -> bool {
        self.get(key).is_some_and(ProjectNode::is_folder)
    }

    /// Parent of `key`.
    pub fn parent(&self, key: ItemKey) -> Option<ItemKey> {
        self.get(key).and_then(|node| node.parent)
    }

    /// Children of `key`; empty when the key is stale.
    pub fn children(&self, key: ItemKey) -> &[ItemKey] {
        self.get(key).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Returns `true` if `key` has no parent and is not the root.
    pub fn is_detached(&self, key: ItemKey) -> bool {
        key != self.root && self.get(key).is_some_and(|node| node.parent.is_none())
    }

    /// The `/`-separated path from the root, e.g. `Assets/Props/Crate.rtprefab`.
    /// Detached nodes yield their own file name.
    pub fn path(&self, key: ItemKey) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.get(k)?;
            segments.push(node.name_ext());
            current = node.parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Child of `parent` whose `name + ext` equals `name_ext`.
    pub fn find_child(&self, parent: ItemKey, name_ext: &str) -> Option<ItemKey> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|n| n.name_ext() == name_ext))
    }

    /// Resolves a path produced by [`ProjectTree::path`].
    pub fn find_by_path(&self, path: &str) -> Option<ItemKey> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let root = self.get(self.root)?;
        if segments.next()? != root.name {
            return None;
        }
        segments.try_fold(self.root, |current, segment| {
            self.find_child(current, segment)
        })
    }

    /// Names of the children of `parent` that use extension `ext`.
    pub fn sibling_names(&self, parent: ItemKey, ext: &str) -> Vec<&str> {
        self.children(parent)
            .iter()
            .filter_map(|child| self.get(*child))
            .filter(|node| node.ext == ext)
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Adds an empty folder under `parent`.
    pub fn insert_folder(&mut self, parent: ItemKey, name: &str) -> ProjectResult<ItemKey> {
        self.check_insert(parent, name, "", None)?;
        let key = self.alloc(ProjectNode {
            name: name.to_string(),
            ext: String::new(),
            kind: NodeKind::Folder,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.push_child(parent, key);
        Ok(key)
    }

    /// Returns the folder at `path`, creating the missing ones.
    ///
    /// ## Errors
    /// `NotFound` if the path does not start with the root name,
    /// `InvalidOperation` if a segment names an existing leaf.
    pub fn ensure_folder_path(&mut self, path: &str) -> ProjectResult<ItemKey> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let root_name = self.node(self.root)?.name.clone();
        if segments.next() != Some(root_name.as_str()) {
            return Err(ProjectError::NotFound(format!("folder '{path}'")));
        }
        let mut current = self.root;
        for segment in segments {
            current = match self.find_child(current, segment) {
                Some(existing) if self.is_folder(existing) => existing,
                Some(_) => {
                    return Err(ProjectError::InvalidOperation(format!(
                        "'{segment}' in '{path}' is not a folder"
                    )))
                }
                None => self.insert_folder(current, segment)?,
            };
        }
        Ok(current)
    }

    /// Adds a leaf under `parent`.
    pub fn insert_leaf(
        &mut self,
        parent: ItemKey,
        name: &str,
        ext: &str,
        leaf: L,
    ) -> ProjectResult<ItemKey> {
        self.check_insert(parent, name, ext, None)?;
        let key = self.alloc(ProjectNode {
            name: name.to_string(),
            ext: ext.to_string(),
            kind: NodeKind::Leaf(leaf),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.push_child(parent, key);
        Ok(key)
    }

    /// Adds a leaf that belongs to no folder.
    pub fn insert_detached(&mut self, name: &str, ext: &str, leaf: L) -> ItemKey {
        self.alloc(ProjectNode {
            name: name.to_string(),
            ext: ext.to_string(),
            kind: NodeKind::Leaf(leaf),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Attaches a detached node under `parent`.
    pub fn attach(&mut self, key: ItemKey, parent: ItemKey) -> ProjectResult<()> {
        if !self.is_detached(key) {
            return Err(ProjectError::InvalidOperation(format!(
                "project item {key:?} is not detached"
            )));
        }
        let (name, ext) = {
            let node = self.node(key)?;
            (node.name.clone(), node.ext.clone())
        };
        self.check_insert(parent, &name, &ext, Some(key))?;
        if let Some(node) = self.get_mut(key) {
            node.parent = Some(parent);
        }
        self.push_child(parent, key);
        Ok(())
    }

    /// Unlinks `key` from its parent, keeping its subtree.
    pub fn detach(&mut self, key: ItemKey) -> ProjectResult<()> {
        if key == self.root {
            return Err(ProjectError::InvalidOperation(
                "the root folder cannot be detached".into(),
            ));
        }
        let parent = self.node(key)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_node) = self.get_mut(parent) {
                parent_node.children.retain(|child| *child != key);
            }
        }
        if let Some(node) = self.get_mut(key) {
            node.parent = None;
        }
        Ok(())
    }

    /// Moves `key` under `new_parent`. Nothing changes on error.
    pub fn move_to(&mut self, key: ItemKey, new_parent: ItemKey) -> ProjectResult<()> {
        if key == self.root {
            return Err(ProjectError::InvalidOperation(
                "the root folder cannot be moved".into(),
            ));
        }
        let (name, ext) = {
            let node = self.node(key)?;
            (node.name.clone(), node.ext.clone())
        };
        self.check_insert(new_parent, &name, &ext, Some(key))?;
        self.detach(key)?;
        if let Some(node) = self.get_mut(key) {
            node.parent = Some(new_parent);
        }
        self.push_child(new_parent, key);
        Ok(())
    }

    /// Renames `key`, keeping its extension.
    pub fn rename(&mut self, key: ItemKey, new_name: &str) -> ProjectResult<()> {
        let (parent, ext) = {
            let node = self.node(key)?;
            (node.parent, node.ext.clone())
        };
        if let Some(parent) = parent {
            let clash = self
                .find_child(parent, &format!("{new_name}{ext}"))
                .is_some_and(|other| other != key);
            if clash {
                return Err(ProjectError::InvalidOperation(format!(
                    "an item named '{new_name}{ext}' already exists"
                )));
            }
        }
        if let Some(node) = self.get_mut(key) {
            node.name = new_name.to_string();
        }
        Ok(())
    }

    /// Removes `key` and its whole subtree.
    ///
    /// ## Returns
    /// The payloads of the removed leaves, in pre-order.
    pub fn remove(&mut self, key: ItemKey) -> ProjectResult<Vec<(ItemKey, L)>> {
        if key == self.root {
            return Err(ProjectError::InvalidOperation(
                "the root folder cannot be removed".into(),
            ));
        }
        let doomed = self.descendants(key);
        if doomed.is_empty() {
            return Err(ProjectError::NotFound(format!("project item {key:?}")));
        }
        self.detach(key)?;
        let mut leaves = Vec::new();
        for k in doomed {
            if let Some(node) = self.release(k) {
                if let NodeKind::Leaf(leaf) = node.kind {
                    leaves.push((k, leaf));
                }
            }
        }
        Ok(leaves)
    }

    /// `key` and every node below it, in pre-order.
    pub fn descendants(&self, key: ItemKey) -> Vec<ItemKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.get(k) {
                out.push(k);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every leaf below `key`, in pre-order.
    pub fn leaves(&self, key: ItemKey) -> Vec<ItemKey> {
        self.descendants(key)
            .into_iter()
            .filter(|k| self.leaf(*k).is_some())
            .collect()
    }

    /// Every detached node.
    pub fn detached(&self) -> Vec<ItemKey> {
        self.keys().filter(|k| self.is_detached(*k)).collect()
    }

    /// Keys of every live node, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|_| ItemKey {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    fn check_insert(
        &self,
        parent: ItemKey,
        name: &str,
        ext: &str,
        moving: Option<ItemKey>,
    ) -> ProjectResult<()> {
        if !self.is_folder(parent) {
            return Err(ProjectError::InvalidOperation(format!(
                "project item {parent:?} is not a folder"
            )));
        }
        if let Some(moving) = moving {
            let mut current = Some(parent);
            while let Some(k) = current {
                if k == moving {
                    return Err(ProjectError::InvalidOperation(
                        "an item cannot be moved into itself".into(),
                    ));
                }
                current = self.parent(k);
            }
        }
        let name_ext = format!("{name}{ext}");
        match self.find_child(parent, &name_ext) {
            Some(existing) if Some(existing) != moving => Err(ProjectError::InvalidOperation(
                format!("an item named '{name_ext}' already exists"),
            )),
            _ => Ok(()),
        }
    }

    fn alloc(&mut self, node: ProjectNode<L>) -> ItemKey {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                ItemKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                ItemKey {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, key: ItemKey) -> Option<ProjectNode<L>> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        Some(node)
    }

    fn push_child(&mut self, parent: ItemKey, child: ItemKey) {
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }
}

impl ProjectTree<AssetItem> {
    /// Rebuilds a tree from a storage snapshot. The snapshot root must be a
    /// folder.
    pub fn from_record(record: &ProjectItemRecord) -> ProjectResult<Self> {
        let ProjectItemRecord::Folder { name, children } = record else {
            return Err(ProjectError::InvalidOperation(
                "the project root must be a folder".into(),
            ));
        };
        let mut tree = ProjectTree::new(name.clone());
        let root = tree.root();
        for child in children {
            tree.insert_record(root, child)?;
        }
        Ok(tree)
    }

    fn insert_record(&mut self, parent: ItemKey, record: &ProjectItemRecord) -> ProjectResult<()> {
        match record {
            ProjectItemRecord::Folder { name, children } => {
                let folder = self.insert_folder(parent, name)?;
                for child in children {
                    self.insert_record(folder, child)?;
                }
            }
            ProjectItemRecord::Asset { name, ext, item } => {
                self.insert_leaf(parent, name, ext, item.clone())?;
            }
        }
        Ok(())
    }

    /// Snapshots the attached part of the tree.
    pub fn to_record(&self) -> ProjectItemRecord {
        self.record_of(self.root)
    }

    fn record_of(&self, key: ItemKey) -> ProjectItemRecord {
        match self.get(key) {
            Some(ProjectNode {
                name,
                ext,
                kind: NodeKind::Leaf(item),
                ..
            }) => ProjectItemRecord::Asset {
                name: name.clone(),
                ext: ext.clone(),
                item: item.clone(),
            },
            Some(node) => ProjectItemRecord::Folder {
                name: node.name.clone(),
                children: node.children.iter().map(|c| self.record_of(*c)).collect(),
            },
            None => ProjectItemRecord::Folder {
                name: String::new(),
                children: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ProjectTree<u32>, ItemKey, ItemKey) {
        let mut tree = ProjectTree::new("Assets");
        let props = tree
            .insert_folder(tree.root(), "Props")
            .expect("insert folder");
        let crate_leaf = tree
            .insert_leaf(props, "Crate", ".rtprefab", 7)
            .expect("insert leaf");
        (tree, props, crate_leaf)
    }

    #[test]
    fn test_insert_and_path() {
        let (tree, props, crate_leaf) = sample();
        assert_eq!(tree.path(crate_leaf).as_deref(), Some("Assets/Props/Crate.rtprefab"));
        assert_eq!(tree.parent(crate_leaf), Some(props));
        assert_eq!(tree.leaf(crate_leaf), Some(&7));
        assert_eq!(tree.find_by_path("Assets/Props/Crate.rtprefab"), Some(crate_leaf));
        assert_eq!(tree.find_by_path("Other/Props"), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_duplicate_name_ext_rejected() {
        let (mut tree, props, _) = sample();
        assert!(tree.insert_leaf(props, "Crate", ".rtprefab", 8).is_err());
        // Same name with another extension is a different item.
        assert!(tree.insert_leaf(props, "Crate", ".rtmat", 8).is_ok());
    }

    #[test]
    fn test_removed_key_goes_stale() {
        let (mut tree, props, crate_leaf) = sample();
        let removed = tree.remove(props).expect("remove folder");
        assert_eq!(removed, vec![(crate_leaf, 7)]);
        assert!(!tree.contains(props));
        assert!(!tree.contains(crate_leaf));

        // The freed slot is reused but the old key does not resolve.
        let reused = tree.insert_folder(tree.root(), "Reused").expect("insert");
        assert!(reused.index() == props.index() || reused.index() == crate_leaf.index());
        assert!(tree.get(props).is_none());
        assert!(tree.get(crate_leaf).is_none());
    }

    #[test]
    fn test_detached_leaf_attach() {
        let (mut tree, props, _) = sample();
        let stub = tree.insert_detached("Plank", ".rtmesh", 9);
        assert!(tree.is_detached(stub));
        assert_eq!(tree.detached(), vec![stub]);

        tree.attach(stub, props).expect("attach");
        assert!(!tree.is_detached(stub));
        assert_eq!(tree.children(props).len(), 2);
    }

    #[test]
    fn test_move_into_descendant_rejected() {
        let (mut tree, props, _) = sample();
        let inner = tree.insert_folder(props, "Inner").expect("insert");
        assert!(tree.move_to(props, inner).is_err());
        assert_eq!(tree.parent(props), Some(tree.root()));
    }

    #[test]
    fn test_move_and_rename() {
        let (mut tree, props, crate_leaf) = sample();
        let other = tree.insert_folder(tree.root(), "Other").expect("insert");
        tree.move_to(crate_leaf, other).expect("move");
        assert!(tree.children(props).is_empty());
        tree.rename(crate_leaf, "Box").expect("rename");
        assert_eq!(tree.path(crate_leaf).as_deref(), Some("Assets/Other/Box.rtprefab"));
    }

    #[test]
    fn test_ensure_folder_path() {
        let (mut tree, props, _) = sample();
        let deep = tree.ensure_folder_path("Assets/Props/Wood/Oak").expect("ensure");
        assert_eq!(tree.path(deep).as_deref(), Some("Assets/Props/Wood/Oak"));
        assert_eq!(tree.ensure_folder_path("Assets/Props").expect("existing"), props);
        assert!(tree.ensure_folder_path("Assets/Props/Crate.rtprefab").is_err());
        assert!(tree.ensure_folder_path("Elsewhere").is_err());
    }

    #[test]
    fn test_record_round_trip() {
        let guid = tessera_core::asset::TypeGuid::from_type_name("Engine.Material");
        let id = tessera_core::AssetId::from_raw(42);
        let mut tree = ProjectTree::new("Assets");
        let folder = tree.insert_folder(tree.root(), "Mats").expect("insert");
        tree.insert_leaf(folder, "Red", ".rtmat", AssetItem::new(id, guid))
            .expect("insert");

        let record = tree.to_record();
        let rebuilt = ProjectTree::from_record(&record).expect("rebuild");
        assert_eq!(rebuilt.to_record(), record);
        let red = rebuilt.find_by_path("Assets/Mats/Red.rtmat").expect("present");
        assert_eq!(rebuilt.leaf(red).map(|item| item.id), Some(id));
    }
}
