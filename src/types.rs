//! Core types for the resource tree service.

/// Snapshot identifier as delivered by the metric retrieval layer.
pub type SnapshotId = i64;

/// Index of a node inside a [`Tree`](crate::tree::Tree) arena.
pub type NodeIndex = usize;

/// Path segment separator used by snapshot paths and collapsed labels.
pub const PATH_DELIMITER: char = '/';

/// Upper bound of the synthetic id range. Generated nodes receive ids
/// strictly below this mark, counting down, so they never collide with
/// real snapshot ids (which are ascending database sequences).
pub const GENERATED_ID_HIGH_WATER: SnapshotId = SnapshotId::MAX;
