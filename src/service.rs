//! Tree service facade.
//!
//! Resolves a visualization request to a fingerprint, builds or fetches the
//! tree through the cache, and exposes the node lookup and synthetic node
//! injection operations used by the layout and dependency layers.

use crate::cache::{SharedTree, TreeCache, TreeFingerprint};
use crate::error::TreeError;
use crate::snapshot::{SnapshotRecord, SnapshotSource, VisualizationRequest};
use crate::tree::optimizer::remove_unnecessary_nodes;
use crate::tree::walker::PathWalker;
use crate::tree::{Tree, TreeNode};
use crate::types::{NodeIndex, SnapshotId};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TreeService {
    source: Arc<dyn SnapshotSource>,
    cache: TreeCache,
}

impl TreeService {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        TreeService {
            source,
            cache: TreeCache::new(),
        }
    }

    /// Operational access to the cache (eviction, diagnostics).
    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Ensure a tree exists for the request and return its fingerprint as
    /// an opaque handle.
    pub fn get_or_create_tree_structure(
        &self,
        request: &VisualizationRequest,
    ) -> Result<TreeFingerprint, TreeError> {
        validate(request)?;
        let fingerprint = TreeFingerprint::from(request);
        debug!(cached = self.cache.size(), %fingerprint, "tree structure requested");

        self.cache
            .get_or_build(&fingerprint, || self.build_tree(request))?;
        Ok(fingerprint)
    }

    /// Direct root lookup for a known fingerprint.
    pub fn get_tree_structure(&self, fingerprint: &TreeFingerprint) -> Result<SharedTree, TreeError> {
        self.shared_tree(fingerprint)
    }

    /// Depth-first search for a node by id. A parent/child chain sharing
    /// the id resolves to the deepest node of the chain.
    pub fn find_node(
        &self,
        fingerprint: &TreeFingerprint,
        id: SnapshotId,
    ) -> Result<TreeNode, TreeError> {
        let shared = self.shared_tree(fingerprint)?;
        let tree = shared.read();
        let index = tree.find_by_id(id).ok_or(TreeError::NodeNotFound(id))?;
        Ok(tree.node(index).clone())
    }

    /// Depth-first search for a node by its unique child-map label.
    pub fn find_interface_leaf_node(
        &self,
        fingerprint: &TreeFingerprint,
        label: &str,
    ) -> Result<TreeNode, TreeError> {
        let shared = self.shared_tree(fingerprint)?;
        let tree = shared.read();
        let index = tree
            .find_by_label(label)
            .ok_or_else(|| TreeError::LabelNotFound(label.to_string()))?;
        Ok(tree.node(index).clone())
    }

    /// Children of the identified node that themselves have children.
    pub fn get_children_node_ids(
        &self,
        fingerprint: &TreeFingerprint,
        id: SnapshotId,
    ) -> Result<Vec<TreeNode>, TreeError> {
        self.with_node(fingerprint, id, |tree, index| {
            tree.children_with_children(index)
                .into_iter()
                .map(|child| tree.node(child).clone())
                .collect()
        })
    }

    /// Children of the identified node that have no children.
    pub fn get_children_leaf_ids(
        &self,
        fingerprint: &TreeFingerprint,
        id: SnapshotId,
    ) -> Result<Vec<TreeNode>, TreeError> {
        self.with_node(fingerprint, id, |tree, index| {
            tree.leaf_children(index)
                .into_iter()
                .map(|child| tree.node(child).clone())
                .collect()
        })
    }

    /// Inject a synthetic dependency leaf under the identified parent,
    /// keyed by `label`. The node receives a freshly allocated generated id
    /// and zero metric values; the mutation is visible to every holder of
    /// the fingerprint.
    pub fn add_interface_leaf_node(
        &self,
        fingerprint: &TreeFingerprint,
        label: &str,
        parent_id: SnapshotId,
    ) -> Result<TreeNode, TreeError> {
        let shared = self.shared_tree(fingerprint)?;
        let mut tree = shared.write();
        let parent = tree
            .find_by_id(parent_id)
            .ok_or(TreeError::NodeNotFound(parent_id))?;
        let index = tree.attach_generated(parent, label);
        debug!(%fingerprint, label, id = tree.node(index).id, "interface leaf node added");
        Ok(tree.node(index).clone())
    }

    fn build_tree(&self, request: &VisualizationRequest) -> Result<Tree, TreeError> {
        info!(root = request.root_snapshot_id, "building tree structure");

        let rows = self
            .source
            .flat_children_with_metrics(request)
            .map_err(TreeError::BuildFailure)?;

        let mut walker = PathWalker::new(request.root_snapshot_id);
        for record in rows.into_iter().map(SnapshotRecord::from) {
            walker.add_record(&record);
        }

        let mut tree = walker.into_tree();
        remove_unnecessary_nodes(&mut tree);
        debug!(
            root = request.root_snapshot_id,
            nodes = tree.reachable_len(),
            "tree structure built"
        );
        Ok(tree)
    }

    fn shared_tree(&self, fingerprint: &TreeFingerprint) -> Result<SharedTree, TreeError> {
        self.cache
            .get(fingerprint)
            .ok_or_else(|| TreeError::FingerprintNotFound(fingerprint.to_string()))
    }

    fn with_node<T>(
        &self,
        fingerprint: &TreeFingerprint,
        id: SnapshotId,
        f: impl FnOnce(&Tree, NodeIndex) -> T,
    ) -> Result<T, TreeError> {
        let shared = self.shared_tree(fingerprint)?;
        let tree = shared.read();
        let index = tree.find_by_id(id).ok_or(TreeError::NodeNotFound(id))?;
        Ok(f(&tree, index))
    }
}

fn validate(request: &VisualizationRequest) -> Result<(), TreeError> {
    if request.root_snapshot_id < 0 {
        return Err(TreeError::InvalidRequest(format!(
            "negative root snapshot id {}",
            request.root_snapshot_id
        )));
    }
    if request.footprint_metric_id < 0 || request.height_metric_id < 0 {
        return Err(TreeError::InvalidRequest(format!(
            "negative metric id ({}, {})",
            request.footprint_metric_id, request.height_metric_id
        )));
    }
    Ok(())
}
