//! Read-only presentation rows for the selected box. This is the only place
//! metrics are rounded and angles turned into degrees.

use crate::ViewKind;
use pc_core::OrientedBox3D;
use pc_geom::{kitti_box_metrics, PointCount};
use serde::{Deserialize, Serialize};

pub const DECIMAL_PLACES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoLabel {
    Length,
    Width,
    Height,
    RotationY,
    PointCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoRow {
    pub label: InfoLabel,
    pub value: String,
}

impl InfoRow {
    fn metric(label: InfoLabel, value: f64) -> Self {
        Self {
            label,
            value: format!("{:.*}", DECIMAL_PLACES, value),
        }
    }
}

/// Length, width, height and rotation (degrees), plus the point count once
/// it is known.
pub fn box_infos(cuboid: &OrientedBox3D, count: Option<PointCount>) -> Vec<InfoRow> {
    let kitti = kitti_box_metrics(cuboid);
    let mut rows = vec![
        InfoRow::metric(InfoLabel::Length, kitti.length),
        InfoRow::metric(InfoLabel::Width, kitti.width),
        InfoRow::metric(InfoLabel::Height, kitti.height),
        InfoRow::metric(InfoLabel::RotationY, kitti.rotation_y.to_degrees()),
    ];
    if let Some(count) = count {
        rows.push(InfoRow {
            label: InfoLabel::PointCount,
            value: count.num.to_string(),
        });
    }
    rows
}

/// The two sizes a single view can show: the back view looks along the box
/// length, every other view across it.
pub fn view_size_info(view: ViewKind, cuboid: &OrientedBox3D) -> [InfoRow; 2] {
    let kitti = kitti_box_metrics(cuboid);
    match view {
        ViewKind::Back => [
            InfoRow::metric(InfoLabel::Width, kitti.width),
            InfoRow::metric(InfoLabel::Height, kitti.height),
        ],
        _ => [
            InfoRow::metric(InfoLabel::Length, kitti.length),
            InfoRow::metric(InfoLabel::Height, kitti.height),
        ],
    }
}
