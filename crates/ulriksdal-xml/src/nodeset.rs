#![forbid(unsafe_code)]

//! Document subsets.
//!
//! A `NodeSet` names the nodes of one document by `NodeId`.  Ids are only
//! meaningful for the document the set was built from.

use std::collections::HashSet;

use roxmltree::{Node, NodeId};

/// A subset of the nodes of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node of the document, comments included.
    pub fn all(doc: &roxmltree::Document<'_>) -> Self {
        Self::subtree(doc.root(), true)
    }

    /// Every node of the document except comments, as selected by a
    /// same-document `URI=""` reference.
    pub fn all_without_comments(doc: &roxmltree::Document<'_>) -> Self {
        Self::subtree(doc.root(), false)
    }

    pub fn tree_without_comments(root: Node<'_, '_>) -> Self {
        Self::subtree(root, false)
    }

    pub fn tree_with_comments(root: Node<'_, '_>) -> Self {
        Self::subtree(root, true)
    }

    fn subtree(root: Node<'_, '_>, comments: bool) -> Self {
        Self {
            nodes: root
                .descendants()
                .filter(|n| comments || !n.is_comment())
                .map(|n| n.id())
                .collect(),
        }
    }

    pub fn contains(&self, node: &Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    pub fn insert(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    /// Drop `root` and everything below it.
    pub fn remove_subtree(&mut self, root: Node<'_, '_>) {
        for n in root.descendants() {
            self.nodes.remove(&n.id());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
