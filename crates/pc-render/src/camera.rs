use glam::DVec3;
use pc_core::{OrientedBox3D, Point2, Point3};
use pc_geom::{canvas_offset_to_world, ViewSize};
use serde::{Deserialize, Serialize};

/// Orthographic camera of one view. The position is kept as an offset from
/// the reference position the view was mounted with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCameraState {
    pub reference_position: Point3,
    pub position_offset: Point3,
    pub zoom: f64,
}

impl Default for ViewCameraState {
    fn default() -> Self {
        Self::new(Point3::ZERO)
    }
}

impl ViewCameraState {
    pub fn new(reference_position: Point3) -> Self {
        Self {
            reference_position,
            position_offset: Point3::ZERO,
            zoom: 1.0,
        }
    }

    pub fn position(&self) -> Point3 {
        (DVec3::from(self.reference_position) + DVec3::from(self.position_offset)).into()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_finite() { zoom.max(0.0) } else { 0.0 };
    }

    pub fn reset(&mut self) {
        self.position_offset = Point3::ZERO;
        self.zoom = 1.0;
    }
}

/// Aligns `camera` with a pan/zoom of the primary 2D view.
///
/// The horizontal pan is turned into the selected box's frame so the camera
/// slides along the box rather than the world axes; the vertical pan moves
/// the camera along world z. Returns `false` without touching the camera
/// when there is no position or no selected box.
pub fn sync_camera_to_canvas_edit(
    current_pos: Option<Point2>,
    zoom: f64,
    view_size: ViewSize,
    selected: Option<&OrientedBox3D>,
    camera: &mut ViewCameraState,
) -> bool {
    let (Some(current_pos), Some(selected)) = (current_pos, selected) else {
        return false;
    };

    let offset = canvas_offset_to_world(current_pos, view_size, zoom);
    camera.set_zoom(zoom);

    let (sin, cos) = selected.rotation().sin_cos();
    camera.position_offset = Point3::new(
        offset.offset_x * sin,
        -offset.offset_x * cos,
        offset.offset_y,
    );
    true
}
