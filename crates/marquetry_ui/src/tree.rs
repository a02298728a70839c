//! Retained UI tree.

use std::collections::HashMap;

use crate::node::{UiElement, UiFlags, UiKind, UiNodeId};

/// Class that hides a node and its subtree.
pub const HIDE_CLASS: &str = "hide";

/// Arena of UI nodes.
pub struct UiTree {
    /// Nodes indexed by ID.
    nodes: HashMap<UiNodeId, UiElement>,
    /// Parent-child relationships, in order.
    children: HashMap<UiNodeId, Vec<UiNodeId>>,
    /// ID counter.
    next_id: u64,
}

impl UiTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: HashMap::with_capacity(256),
            children: HashMap::with_capacity(256),
            next_id: 1,
        }
    }

    /// Creates a detached node.
    pub fn create(&mut self, kind: UiKind) -> UiNodeId {
        let id = UiNodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, UiElement::new(id, kind));
        self.children.insert(id, Vec::new());
        id
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if the node exists.
    #[must_use]
    pub fn contains(&self, id: UiNodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Gets a node.
    #[must_use]
    pub fn get(&self, id: UiNodeId) -> Option<&UiElement> {
        self.nodes.get(&id)
    }

    /// Gets mutable access to a node.
    pub fn get_mut(&mut self, id: UiNodeId) -> Option<&mut UiElement> {
        self.nodes.get_mut(&id)
    }

    /// Children of a node, in order.
    #[must_use]
    pub fn children(&self, id: UiNodeId) -> &[UiNodeId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: UiNodeId) -> Option<UiNodeId> {
        self.nodes.get(&id)?.parent
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    ///
    /// Returns false if either node is missing or `child` is an ancestor of
    /// `parent`.
    pub fn append(&mut self, parent: UiNodeId, child: UiNodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.is_ancestor(child, parent) {
            return false;
        }
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.children.entry(parent).or_default().push(child);
        true
    }

    fn is_ancestor(&self, ancestor: UiNodeId, mut node: UiNodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn unlink(&mut self, id: UiNodeId) {
        if let Some(parent) = self.nodes.get_mut(&id).and_then(|n| n.parent.take()) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|&c| c != id);
            }
        }
    }

    /// Removes a node and its subtree. Returns the removed IDs.
    pub fn remove(&mut self, id: UiNodeId) -> Vec<UiNodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.unlink(id);
        let removed: Vec<_> = self.iter_dfs(id).collect();
        for node in &removed {
            self.nodes.remove(node);
            self.children.remove(node);
        }
        removed
    }

    /// Removes every child subtree of a node. Returns the removed IDs.
    pub fn clear_children(&mut self, id: UiNodeId) -> Vec<UiNodeId> {
        let children = self.children(id).to_vec();
        children.into_iter().flat_map(|c| self.remove(c)).collect()
    }

    /// Adds a class tag.
    pub fn add_class(&mut self, id: UiNodeId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    /// Removes a class tag.
    pub fn remove_class(&mut self, id: UiNodeId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.classes.retain(|c| c != class);
        }
    }

    /// Adds or removes a class tag.
    pub fn set_class(&mut self, id: UiNodeId, class: &str, on: bool) {
        if on {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
    }

    /// Returns true if the node carries the class.
    #[must_use]
    pub fn has_class(&self, id: UiNodeId, class: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.has_class(class))
    }

    /// Nodes under `root` (inclusive) carrying the class, in DFS order.
    #[must_use]
    pub fn query_class(&self, root: UiNodeId, class: &str) -> Vec<UiNodeId> {
        self.iter_dfs(root)
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Nodes under `root` (inclusive) of a kind, in DFS order.
    #[must_use]
    pub fn query_kind(&self, root: UiNodeId, matches: impl Fn(&UiKind) -> bool) -> Vec<UiNodeId> {
        self.iter_dfs(root)
            .filter(|id| self.nodes.get(id).is_some_and(|n| matches(&n.kind)))
            .collect()
    }

    /// First node under `root` (inclusive) with the name.
    #[must_use]
    pub fn find_by_name(&self, root: UiNodeId, name: &str) -> Option<UiNodeId> {
        self.iter_dfs(root)
            .find(|id| self.nodes.get(id).is_some_and(|n| n.name == name))
    }

    /// Returns true if neither the node nor any ancestor is hidden.
    #[must_use]
    pub fn is_displayed(&self, id: UiNodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(&node_id) else {
                return false;
            };
            if node.has_class(HIDE_CLASS) || !node.flags.has(UiFlags::VISIBLE) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Sets the attached flag on a subtree. Returns nodes whose flag changed.
    pub fn mark_attached(&mut self, root: UiNodeId, attached: bool) -> Vec<UiNodeId> {
        let subtree: Vec<_> = self.iter_dfs(root).collect();
        subtree
            .into_iter()
            .filter(|id| match self.nodes.get_mut(id) {
                Some(node) if node.is_attached() != attached => {
                    node.flags.assign(UiFlags::ATTACHED, attached);
                    true
                }
                _ => false,
            })
            .collect()
    }

    /// Node IDs under `root` (inclusive) in depth-first order.
    pub fn iter_dfs(&self, root: UiNodeId) -> impl Iterator<Item = UiNodeId> + '_ {
        UiDfsIterator {
            tree: self,
            stack: if self.contains(root) { vec![root] } else { Vec::new() },
        }
    }

    /// Depth of a node below its topmost ancestor.
    #[must_use]
    pub fn depth(&self, id: UiNodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }
}

impl Default for UiTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first iterator over a subtree.
struct UiDfsIterator<'a> {
    tree: &'a UiTree,
    stack: Vec<UiNodeId>,
}

impl Iterator for UiDfsIterator<'_> {
    type Item = UiNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Reverse push keeps siblings left-to-right.
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_hierarchy() {
        let mut tree = UiTree::new();
        let root = tree.create(UiKind::Container);
        let a = tree.create(UiKind::Label);
        let b = tree.create(UiKind::Container);
        let c = tree.create(UiKind::Label);
        assert!(tree.append(root, a));
        assert!(tree.append(root, b));
        assert!(tree.append(b, c));
        assert!(!tree.append(c, root));

        assert_eq!(tree.iter_dfs(root).collect::<Vec<_>>(), vec![root, a, b, c]);
        assert_eq!(tree.depth(c), 2);

        let removed = tree.remove(b);
        assert_eq!(removed, vec![b, c]);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_hide_class_hides_subtree() {
        let mut tree = UiTree::new();
        let root = tree.create(UiKind::Container);
        let child = tree.create(UiKind::Label);
        tree.append(root, child);
        tree.add_class(child, "validation-error");
        assert!(tree.is_displayed(child));
        tree.add_class(root, HIDE_CLASS);
        assert!(!tree.is_displayed(child));
        assert_eq!(tree.query_class(root, "validation-error"), vec![child]);
    }

    #[test]
    fn test_reparenting_moves_node() {
        let mut tree = UiTree::new();
        let first = tree.create(UiKind::Container);
        let second = tree.create(UiKind::Container);
        let leaf = tree.create(UiKind::Label);
        tree.append(first, leaf);
        tree.append(second, leaf);
        assert!(tree.children(first).is_empty());
        assert_eq!(tree.parent(leaf), Some(second));
    }
}
