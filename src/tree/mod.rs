//! Resource tree arena and node types.
//!
//! Nodes live in an index-based arena; parent links are plain indices, so
//! the structure is a strict hierarchy by construction. Pruned or collapsed
//! nodes keep their slot but become unreachable from the root.

pub mod optimizer;
pub mod walker;

use crate::types::{NodeIndex, SnapshotId, GENERATED_ID_HIGH_WATER};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Node kind within the resource tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Directory,
    File,
    DependencyGenerated,
}

/// One node of the resource tree.
///
/// `label` equals the key under which the node is stored in its parent's
/// child map; labels are unique among siblings. Metric values are 0 for
/// structural directory nodes.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: SnapshotId,
    pub parent: Option<NodeIndex>,
    pub depth: u32,
    pub node_type: NodeType,
    pub label: String,
    pub footprint_value: f64,
    pub height_value: f64,
    pub children: BTreeMap<String, NodeIndex>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Descending allocator for synthetic node ids.
///
/// Ids start just below [`GENERATED_ID_HIGH_WATER`] and strictly decrease,
/// so they never overlap the ascending real id space. Safe to advance from
/// multiple threads.
#[derive(Debug)]
pub struct GeneratedIdSequence(AtomicI64);

impl GeneratedIdSequence {
    pub fn new() -> Self {
        GeneratedIdSequence(AtomicI64::new(GENERATED_ID_HIGH_WATER))
    }

    pub fn next_id(&self) -> SnapshotId {
        self.0.fetch_sub(1, Ordering::Relaxed) - 1
    }
}

impl Default for GeneratedIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// The resource tree.
///
/// Carries its own generated id sequence so synthetic id allocation on one
/// tree never contends with unrelated trees.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeIndex,
    generated_ids: GeneratedIdSequence,
}

impl Tree {
    /// Create a tree holding only the root directory node.
    pub fn new(root_id: SnapshotId) -> Self {
        let root = TreeNode {
            id: root_id,
            parent: None,
            depth: 0,
            node_type: NodeType::Directory,
            label: "root".to_string(),
            footprint_value: 0.0,
            height_value: 0.0,
            children: BTreeMap::new(),
        };
        Tree {
            nodes: vec![root],
            root: 0,
            generated_ids: GeneratedIdSequence::new(),
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.nodes[index]
    }

    /// Child of `parent` keyed by `label`, if present.
    pub fn child(&self, parent: NodeIndex, label: &str) -> Option<NodeIndex> {
        self.nodes[parent].children.get(label).copied()
    }

    /// Attach a new child under `parent`, keyed by `label`. The caller is
    /// responsible for checking that the label is free; an existing entry
    /// would be replaced, orphaning its subtree.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        id: SnapshotId,
        node_type: NodeType,
        label: &str,
        footprint_value: f64,
        height_value: f64,
    ) -> NodeIndex {
        let depth = self.nodes[parent].depth + 1;
        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            id,
            parent: Some(parent),
            depth,
            node_type,
            label: label.to_string(),
            footprint_value,
            height_value,
            children: BTreeMap::new(),
        });
        self.nodes[parent].children.insert(label.to_string(), index);
        index
    }

    /// Attach a synthetic dependency node under `parent`, keyed by `label`,
    /// with a freshly allocated generated id and zero metric values. If the
    /// label already exists under the parent, the existing child is reused
    /// and no id is allocated.
    pub fn attach_generated(&mut self, parent: NodeIndex, label: &str) -> NodeIndex {
        if let Some(existing) = self.child(parent, label) {
            return existing;
        }
        let id = self.generated_ids.next_id();
        self.add_child(parent, id, NodeType::DependencyGenerated, label, 0.0, 0.0)
    }

    /// Depth-first search for a node by id.
    ///
    /// Path walking can leave a parent and child with the same id; lookup
    /// descends through such chains and returns the deepest node carrying
    /// the id.
    pub fn find_by_id(&self, id: SnapshotId) -> Option<NodeIndex> {
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if self.nodes[index].id == id {
                return Some(self.descend_same_id(index));
            }
            stack.extend(self.nodes[index].children.values().copied());
        }
        None
    }

    fn descend_same_id(&self, start: NodeIndex) -> NodeIndex {
        let mut current = start;
        'descend: loop {
            let node = &self.nodes[current];
            for &child in node.children.values() {
                if self.nodes[child].id == node.id {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Depth-first search for a node by its child-map label.
    pub fn find_by_label(&self, label: &str) -> Option<NodeIndex> {
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            if let Some(found) = self.nodes[index].children.get(label) {
                return Some(*found);
            }
            stack.extend(self.nodes[index].children.values().copied());
        }
        None
    }

    /// Children of `index` that themselves have children.
    pub fn children_with_children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.nodes[index]
            .children
            .values()
            .copied()
            .filter(|&child| !self.nodes[child].is_leaf())
            .collect()
    }

    /// Children of `index` that have no children.
    pub fn leaf_children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.nodes[index]
            .children
            .values()
            .copied()
            .filter(|&child| self.nodes[child].is_leaf())
            .collect()
    }

    /// All reachable nodes, depth-first from the root.
    pub fn walk(&self) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            result.push(index);
            stack.extend(self.nodes[index].children.values().copied());
        }
        result
    }

    /// Ids of all reachable file and dependency-generated nodes.
    pub fn leaf_ids(&self) -> Vec<SnapshotId> {
        self.walk()
            .into_iter()
            .filter(|&index| self.nodes[index].node_type != NodeType::Directory)
            .map(|index| self.nodes[index].id)
            .collect()
    }

    /// Number of nodes reachable from the root.
    pub fn reachable_len(&self) -> usize {
        self.walk().len()
    }

    /// Nested JSON export consumed by the webservice layer. Children are
    /// emitted in label order.
    pub fn to_json_value(&self) -> Value {
        self.node_value(self.root)
    }

    fn node_value(&self, index: NodeIndex) -> Value {
        let node = &self.nodes[index];
        let children: Vec<Value> = node
            .children
            .values()
            .map(|&child| self.node_value(child))
            .collect();
        json!({
            "id": node.id,
            "depth": node.depth,
            "node_type": node.node_type,
            "label": node.label,
            "footprint_value": node.footprint_value,
            "height_value": node.height_value,
            "children": children,
        })
    }
}
