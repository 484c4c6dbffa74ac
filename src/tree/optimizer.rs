//! Tree optimization: collapse of redundant directory chains.
//!
//! A directory with exactly one child carries no visual information in the
//! city layout; it is spliced out and its label folded into the child's.
//! Depths are NOT renumbered after a collapse — they keep reflecting the
//! original structural distance, which the layout layer expects.

use super::{NodeType, Tree};
use crate::types::{NodeIndex, PATH_DELIMITER};

/// Remove structurally unnecessary nodes, bottom-up.
///
/// Non-root directories with a single child are collapsed into that child
/// (child re-parented under the grandparent, keyed by
/// `"<directory>/<child>"`); directories without children are pruned.
/// File and dependency-generated nodes are never touched, so the leaf set
/// is preserved. Running the pass again on an optimized tree is a no-op.
pub fn remove_unnecessary_nodes(tree: &mut Tree) {
    optimize_children(tree, tree.root());
}

fn optimize_children(tree: &mut Tree, index: NodeIndex) {
    let children: Vec<NodeIndex> = tree.node(index).children.values().copied().collect();
    for child in children {
        optimize_children(tree, child);
    }

    let entries: Vec<(String, NodeIndex)> = tree
        .node(index)
        .children
        .iter()
        .map(|(label, &child)| (label.clone(), child))
        .collect();

    for (label, child) in entries {
        if tree.node(child).node_type != NodeType::Directory {
            continue;
        }
        match tree.node(child).children.len() {
            // A module or folder that produced no files.
            0 => {
                tree.node_mut(index).children.remove(&label);
                tree.node_mut(child).parent = None;
            }
            1 => splice_single_child(tree, index, &label, child),
            _ => {}
        }
    }
}

/// Replace `child` in `parent`'s map by its only grandchild, relabeled as
/// the delimiter-joined concatenation of both labels.
fn splice_single_child(tree: &mut Tree, parent: NodeIndex, label: &str, child: NodeIndex) {
    let (grandchild_label, grandchild) = {
        let (l, &g) = tree.node(child).children.iter().next().unwrap();
        (l.clone(), g)
    };
    let merged = format!("{}{}{}", label, PATH_DELIMITER, grandchild_label);

    tree.node_mut(parent).children.remove(label);
    tree.node_mut(parent)
        .children
        .insert(merged.clone(), grandchild);

    let node = tree.node_mut(grandchild);
    node.parent = Some(parent);
    node.label = merged;

    let detached = tree.node_mut(child);
    detached.parent = None;
    detached.children.clear();
}
