//! Path walker: flat snapshot records into a tree.

use super::{NodeType, Tree};
use crate::snapshot::SnapshotRecord;
use crate::types::{NodeIndex, SnapshotId, PATH_DELIMITER};

/// Builds a [`Tree`] incrementally from flat, path-tagged records.
///
/// Each record path is split into segments; intermediate segments create or
/// reuse directory nodes, the final segment carries the record's id and
/// metric values. Directory nodes take the id of the record that first
/// created them, which is where same-id parent/child chains come from.
pub struct PathWalker {
    tree: Tree,
}

impl PathWalker {
    pub fn new(root_snapshot_id: SnapshotId) -> Self {
        PathWalker {
            tree: Tree::new(root_snapshot_id),
        }
    }

    /// Walk one record into the tree. Records whose path has no non-empty
    /// segments are skipped; empty segments from consecutive delimiters
    /// never produce empty-label nodes. Duplicate paths merge into the
    /// existing node instead of creating a sibling with the same key.
    pub fn add_record(&mut self, record: &SnapshotRecord) {
        let segments: Vec<&str> = record
            .path
            .split(PATH_DELIMITER)
            .filter(|segment| !segment.is_empty())
            .collect();
        let Some((leaf_label, directories)) = segments.split_last() else {
            return;
        };

        let mut current = self.tree.root();
        for segment in directories {
            current = self.directory_child(current, segment, record.id);
        }
        self.file_child(current, leaf_label, record);
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    fn directory_child(&mut self, parent: NodeIndex, label: &str, id: SnapshotId) -> NodeIndex {
        if let Some(existing) = self.tree.child(parent, label) {
            return existing;
        }
        self.tree
            .add_child(parent, id, NodeType::Directory, label, 0.0, 0.0)
    }

    fn file_child(&mut self, parent: NodeIndex, label: &str, record: &SnapshotRecord) {
        match self.tree.child(parent, label) {
            // Merge: the node was created earlier as an intermediate
            // directory of a longer path, or by a duplicate record.
            Some(existing) => {
                let node = self.tree.node_mut(existing);
                node.id = record.id;
                node.node_type = NodeType::File;
                node.footprint_value = record.footprint_value;
                node.height_value = record.height_value;
            }
            None => {
                self.tree.add_child(
                    parent,
                    record.id,
                    NodeType::File,
                    label,
                    record.footprint_value,
                    record.height_value,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRecord;

    fn walk(records: &[SnapshotRecord]) -> Tree {
        let mut walker = PathWalker::new(100);
        for record in records {
            walker.add_record(record);
        }
        walker.into_tree()
    }

    #[test]
    fn empty_record_list_yields_bare_root() {
        let tree = walk(&[]);
        assert!(tree.node(tree.root()).is_leaf());
    }

    #[test]
    fn single_segment_path_is_direct_root_child() {
        let tree = walk(&[SnapshotRecord::new(1, "pom.xml", 2.0, 1.0)]);
        let child = tree.child(tree.root(), "pom.xml").unwrap();
        assert_eq!(tree.node(child).node_type, NodeType::File);
        assert_eq!(tree.node(child).depth, 1);
    }

    #[test]
    fn one_file_leaf_per_record_along_its_path() {
        let tree = walk(&[
            SnapshotRecord::new(1, "mod/a/File.java", 10.0, 5.0),
            SnapshotRecord::new(2, "mod/b/File.java", 3.0, 7.0),
        ]);

        let module = tree.child(tree.root(), "mod").unwrap();
        let a = tree.child(module, "a").unwrap();
        let b = tree.child(module, "b").unwrap();
        let file_a = tree.child(a, "File.java").unwrap();
        let file_b = tree.child(b, "File.java").unwrap();

        assert_eq!(tree.node(module).node_type, NodeType::Directory);
        assert_eq!(tree.node(file_a).id, 1);
        assert_eq!(tree.node(file_a).footprint_value, 10.0);
        assert_eq!(tree.node(file_b).id, 2);
        assert_eq!(tree.node(file_b).height_value, 7.0);
        assert_eq!(tree.leaf_ids().len(), 2);
    }

    #[test]
    fn intermediate_directories_carry_creating_record_id() {
        let tree = walk(&[SnapshotRecord::new(5, "x/y/F.java", 1.0, 1.0)]);
        let x = tree.child(tree.root(), "x").unwrap();
        let y = tree.child(x, "y").unwrap();

        assert_eq!(tree.node(x).id, 5);
        assert_eq!(tree.node(y).id, 5);
        assert_eq!(tree.node(x).footprint_value, 0.0);
        // Same-id lookup resolves to the file at the end of the chain.
        let found = tree.find_by_id(5).unwrap();
        assert_eq!(tree.node(found).node_type, NodeType::File);
    }

    #[test]
    fn consecutive_delimiters_do_not_create_empty_labels() {
        let tree = walk(&[SnapshotRecord::new(1, "mod//a///File.java", 1.0, 1.0)]);
        let module = tree.child(tree.root(), "mod").unwrap();
        let a = tree.child(module, "a").unwrap();

        assert!(tree.child(module, "").is_none());
        assert!(tree.child(a, "File.java").is_some());
    }

    #[test]
    fn duplicate_record_merges_instead_of_duplicating() {
        let tree = walk(&[
            SnapshotRecord::new(1, "mod/File.java", 1.0, 1.0),
            SnapshotRecord::new(1, "mod/File.java", 2.0, 3.0),
        ]);

        let module = tree.child(tree.root(), "mod").unwrap();
        assert_eq!(tree.node(module).children.len(), 1);
        let file = tree.child(module, "File.java").unwrap();
        assert_eq!(tree.node(file).footprint_value, 2.0);
        assert_eq!(tree.node(file).height_value, 3.0);
    }

    #[test]
    fn path_with_only_delimiters_is_skipped() {
        let tree = walk(&[SnapshotRecord::new(1, "///", 1.0, 1.0)]);
        assert!(tree.node(tree.root()).is_leaf());
    }
}
