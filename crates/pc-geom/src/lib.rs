//! Geometry kernel and point containment for the annotation views.

mod containment;
mod kernel;

use pc_core::{BoxError, Footprint, OrientedBox3D};
use thiserror::Error;

pub use containment::{point_in_polygon, PointCloud, PointCount};
pub use kernel::{
    apply_box_delta, box_footprint, box_from_kitti, canvas_offset_to_world, kitti_box_metrics,
    line_center, line_length, normalize_angle, polygon_area, polygon_delta_to_box_delta,
    rotate_box, BoxDelta, KittiMetrics, ViewSize, WorldOffset, MIN_DIMENSION,
};

#[derive(Debug, Error)]
pub enum GeomError {
    #[error(transparent)]
    Box(#[from] BoxError),
    #[error("point buffer length {0} is not a multiple of 3")]
    RaggedPointBuffer(usize),
}

/// Projects a cuboid from the 3D scene onto its 2D footprint polygon.
pub trait CuboidProjector {
    fn project_footprint(&self, cuboid: &OrientedBox3D) -> Footprint;
}

/// Ground-plane projection used when the scene supplies nothing better.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopDownProjector;

impl CuboidProjector for TopDownProjector {
    fn project_footprint(&self, cuboid: &OrientedBox3D) -> Footprint {
        box_footprint(cuboid)
    }
}
