//! Snapshot records and the metric retrieval boundary.
//!
//! The database layer lives outside this crate; it delivers one row per
//! file-scoped element under a project root. Rows are normalized here
//! before the path walker sees them.

use crate::types::SnapshotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// View requested by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewType {
    City,
    Dependency,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewType::City => write!(f, "CITY"),
            ViewType::Dependency => write!(f, "DEPENDENCY"),
        }
    }
}

/// Parameters of a single visualization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualizationRequest {
    pub root_snapshot_id: SnapshotId,
    pub view_type: ViewType,
    pub footprint_metric_id: SnapshotId,
    pub height_metric_id: SnapshotId,
}

/// Raw measure row as delivered by the metric retrieval layer. Metric
/// values are missing when no measure exists for a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureRow {
    pub id: SnapshotId,
    pub path: String,
    pub footprint_value: Option<f64>,
    pub height_value: Option<f64>,
}

/// Normalized snapshot record consumed by the path walker.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub path: String,
    pub footprint_value: f64,
    pub height_value: f64,
}

impl SnapshotRecord {
    pub fn new(id: SnapshotId, path: impl Into<String>, footprint: f64, height: f64) -> Self {
        SnapshotRecord {
            id,
            path: path.into(),
            footprint_value: footprint,
            height_value: height,
        }
    }
}

impl From<MeasureRow> for SnapshotRecord {
    fn from(row: MeasureRow) -> Self {
        SnapshotRecord {
            id: row.id,
            path: row.path,
            footprint_value: row.footprint_value.unwrap_or(0.0),
            height_value: row.height_value.unwrap_or(0.0),
        }
    }
}

/// Metric retrieval collaborator.
///
/// Implemented by the database-facing layer. Returns one row per
/// file-scoped element under the requested root.
pub trait SnapshotSource: Send + Sync {
    fn flat_children_with_metrics(
        &self,
        request: &VisualizationRequest,
    ) -> anyhow::Result<Vec<MeasureRow>>;
}

/// Min/max range of a metric over a record set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMaxValue {
    pub min: f64,
    pub max: f64,
}

/// Footprint and height ranges over a normalized record set. `None` for an
/// empty set. The layout layer scales building dimensions from these.
pub fn metric_ranges(records: &[SnapshotRecord]) -> Option<(MinMaxValue, MinMaxValue)> {
    let first = records.first()?;
    let mut footprint = MinMaxValue {
        min: first.footprint_value,
        max: first.footprint_value,
    };
    let mut height = MinMaxValue {
        min: first.height_value,
        max: first.height_value,
    };
    for record in &records[1..] {
        footprint.min = footprint.min.min(record.footprint_value);
        footprint.max = footprint.max.max(record.footprint_value);
        height.min = height.min.min(record.height_value);
        height.max = height.max.max(record.height_value);
    }
    Some((footprint, height))
}
