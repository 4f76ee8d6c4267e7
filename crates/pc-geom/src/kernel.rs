//! Stateless geometry shared by the 2D views and the 3D scene.
//!
//! Angles are radians throughout; conversion to degrees happens only where
//! values are presented.

use crate::GeomError;
use glam::{DMat2, DVec2};
use pc_core::{Footprint, OrientedBox3D, Point2, Point3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Smallest width/height a resize can shrink a box to.
pub const MIN_DIMENSION: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSize {
    pub width: f64,
    pub height: f64,
}

impl ViewSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldOffset {
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxDelta {
    pub center_offset: Point3,
    pub width_offset: f64,
    pub height_offset: f64,
}

impl BoxDelta {
    pub fn is_zero(&self) -> bool {
        self.center_offset == Point3::ZERO && self.width_offset == 0.0 && self.height_offset == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KittiMetrics {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_y: f64,
}

pub fn line_center(p: Point2, q: Point2) -> Point2 {
    Point2::new((p.x + q.x) * 0.5, (p.y + q.y) * 0.5)
}

pub fn line_length(p: Point2, q: Point2) -> f64 {
    DVec2::from(p).distance(DVec2::from(q))
}

/// World-space offset of a panned/zoomed canvas relative to the view center.
///
/// Canvas y grows downward while the world's vertical axis grows upward, so
/// `offset_y` carries the opposite sign of `offset_x`.
pub fn canvas_offset_to_world(current_pos: Point2, view_size: ViewSize, zoom: f64) -> WorldOffset {
    if !zoom.is_finite() || zoom == 0.0 {
        return WorldOffset::default();
    }
    let canvas_center = Point2::new(
        current_pos.x + view_size.width * zoom / 2.0,
        current_pos.y + view_size.height * zoom / 2.0,
    );
    let world_center = Point2::new(view_size.width / 2.0, view_size.height / 2.0);
    WorldOffset {
        offset_x: (world_center.x - canvas_center.x) / zoom,
        offset_y: -(world_center.y - canvas_center.y) / zoom,
    }
}

/// Converts a polygon drag into a box delta.
///
/// Only vertices 0, 1 and 2 are read, and the edge roles are fixed by index:
/// `0-1` is the height edge, `1-2` the width edge. Both polygons must share
/// the same vertex order.
pub fn polygon_delta_to_box_delta(new_polygon: &Footprint, origin_polygon: &Footprint) -> BoxDelta {
    let [p1, p2, p3, _] = *new_polygon;
    let [o1, o2, o3, _] = *origin_polygon;

    let new_center = line_center(p1, p3);
    let old_center = line_center(o1, o3);

    BoxDelta {
        // Footprints are flat: 2D y drives the 3D z axis.
        center_offset: Point3::new(new_center.x - old_center.x, 0.0, new_center.y - old_center.y),
        height_offset: line_length(p1, p2) - line_length(o1, o2),
        width_offset: line_length(p2, p3) - line_length(o2, o3),
    }
}

/// Applies `delta` to a copy of `cuboid`. The horizontal part of the center
/// offset is in the box frame and is rotated into world x/y; depth and
/// rotation are untouched.
pub fn apply_box_delta(cuboid: &OrientedBox3D, delta: &BoxDelta) -> OrientedBox3D {
    let local = DVec2::new(delta.center_offset.x, delta.center_offset.y);
    let world = DMat2::from_angle(cuboid.rotation()) * local;
    let center = cuboid.center();
    let center = Point3::new(
        center.x + world.x,
        center.y + world.y,
        center.z + delta.center_offset.z,
    );

    let mut next = cuboid.clone();
    next.set_geometry(
        center,
        cuboid.width() + delta.width_offset,
        cuboid.height() + delta.height_offset,
        MIN_DIMENSION,
    );
    next
}

/// Wraps an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Rotates a box about its own center, footprint included.
pub fn rotate_box(cuboid: &OrientedBox3D, angle: f64) -> OrientedBox3D {
    let center = DVec2::new(cuboid.center().x, cuboid.center().y);
    let rot = DMat2::from_angle(angle);
    let footprint = cuboid
        .footprint()
        .map(|p| Point2::from(center + rot * (DVec2::from(p) - center)));

    let mut next = cuboid.clone();
    next.set_rotation(cuboid.rotation() + angle);
    next.set_footprint(footprint);
    next
}

/// Ground-plane corners of a box in the order the 2D views expect: the
/// first edge spans the height, the second spans the width.
pub fn box_footprint(cuboid: &OrientedBox3D) -> Footprint {
    let half_w = cuboid.width() / 2.0;
    let half_h = cuboid.height() / 2.0;
    let center = DVec2::new(cuboid.center().x, cuboid.center().y);
    let rot = DMat2::from_angle(cuboid.rotation());
    [
        DVec2::new(-half_w, -half_h),
        DVec2::new(-half_w, half_h),
        DVec2::new(half_w, half_h),
        DVec2::new(half_w, -half_h),
    ]
    .map(|corner| Point2::from(center + rot * corner))
}

/// Unsigned shoelace area.
pub fn polygon_area(polygon: &[Point2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    (twice * 0.5).abs()
}

/// KITTI-style description. Rounding is left to the presentation layer.
pub fn kitti_box_metrics(cuboid: &OrientedBox3D) -> KittiMetrics {
    KittiMetrics {
        length: cuboid.width(),
        width: cuboid.height(),
        height: cuboid.depth(),
        rotation_y: normalize_angle(-cuboid.rotation() - FRAC_PI_2),
    }
}

/// Inverse of [`kitti_box_metrics`].
pub fn box_from_kitti(
    id: impl Into<String>,
    center: Point3,
    metrics: &KittiMetrics,
) -> Result<OrientedBox3D, GeomError> {
    let mut cuboid = OrientedBox3D::new(
        id,
        center,
        metrics.length,
        metrics.width,
        metrics.height,
        normalize_angle(-metrics.rotation_y - FRAC_PI_2),
    )?;
    cuboid.set_footprint(box_footprint(&cuboid));
    Ok(cuboid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rect(cx: f64, cy: f64, w: f64, h: f64) -> Footprint {
        [
            Point2::new(cx - w / 2.0, cy - h / 2.0),
            Point2::new(cx - w / 2.0, cy + h / 2.0),
            Point2::new(cx + w / 2.0, cy + h / 2.0),
            Point2::new(cx + w / 2.0, cy - h / 2.0),
        ]
    }

    fn box_a() -> OrientedBox3D {
        let mut b = OrientedBox3D::new("a", Point3::ZERO, 2.0, 4.0, 1.0, 0.0).unwrap();
        b.set_footprint(box_footprint(&b));
        b
    }

    #[test]
    fn line_helpers() {
        let p = Point2::new(1.0, 1.0);
        assert_eq!(line_center(p, Point2::new(3.0, 5.0)), Point2::new(2.0, 3.0));
        assert_eq!(line_length(p, Point2::new(4.0, 5.0)), 5.0);
        assert_eq!(line_length(p, p), 0.0);
    }

    #[test]
    fn centered_canvas_has_zero_offset() {
        let offset = canvas_offset_to_world(Point2::ZERO, ViewSize::new(200.0, 100.0), 1.0);
        assert_eq!(offset, WorldOffset { offset_x: 0.0, offset_y: 0.0 });
    }

    #[test]
    fn canvas_offset_y_is_negated() {
        // Panning right and down by the same amount yields opposite signs.
        let offset = canvas_offset_to_world(Point2::new(10.0, 10.0), ViewSize::new(200.0, 100.0), 1.0);
        assert_eq!(offset.offset_x, -10.0);
        assert_eq!(offset.offset_y, 10.0);

        let zoomed = canvas_offset_to_world(Point2::new(-50.0, -25.0), ViewSize::new(200.0, 100.0), 2.0);
        assert!((zoomed.offset_x - -25.0).abs() < EPS);
        assert!((zoomed.offset_y - 12.5).abs() < EPS);
    }

    #[test]
    fn zero_zoom_is_degenerate_not_infinite() {
        let offset = canvas_offset_to_world(Point2::new(3.0, 4.0), ViewSize::new(200.0, 100.0), 0.0);
        assert_eq!(offset, WorldOffset::default());
    }

    #[test]
    fn identical_polygons_give_zero_delta() {
        let p = rect(3.0, -1.0, 2.0, 4.0);
        let mut q = p;
        q[3] = Point2::new(100.0, 100.0);
        assert!(polygon_delta_to_box_delta(&p, &p).is_zero());
        assert!(polygon_delta_to_box_delta(&q, &p).is_zero());
    }

    #[test]
    fn edges_follow_vertex_index_not_length() {
        // Width edge (1-2) much longer than height edge (0-1).
        let origin = rect(0.0, 0.0, 10.0, 1.0);
        let grown = rect(0.0, 0.0, 10.0, 3.0);
        let delta = polygon_delta_to_box_delta(&grown, &origin);
        assert!((delta.height_offset - 2.0).abs() < EPS);
        assert!(delta.width_offset.abs() < EPS);
    }

    #[test]
    fn center_offset_maps_y_to_z() {
        let origin = rect(0.0, 0.0, 2.0, 4.0);
        let moved = rect(1.5, -0.5, 2.0, 4.0);
        let delta = polygon_delta_to_box_delta(&moved, &origin);
        assert_eq!(delta.center_offset, Point3::new(1.5, 0.0, -0.5));
    }

    #[test]
    fn shrinking_height_edge_by_one() {
        let a = box_a();
        let origin = rect(0.0, 0.0, 2.0, 4.0);
        let shrunk = [
            Point2::new(-1.0, -1.5),
            Point2::new(-1.0, 1.5),
            Point2::new(1.0, 1.5),
            Point2::new(1.0, -1.5),
        ];
        let delta = polygon_delta_to_box_delta(&shrunk, &origin);
        let a2 = apply_box_delta(&a, &delta);
        assert!((a2.height() - 3.0).abs() < EPS);
        assert!((a2.width() - 2.0).abs() < EPS);
        assert_eq!(a2.center(), a.center());
        assert_eq!(a2.z_range(), a.z_range());
        assert_eq!(a2.depth(), a.depth());
    }

    #[test]
    fn apply_delta_keeps_depth_and_rotation() {
        for rotation in [0.0, 0.3, -2.0, PI] {
            let b = OrientedBox3D::new("b", Point3::new(1.0, 2.0, 3.0), 1.0, 2.0, 0.5, rotation).unwrap();
            let delta = BoxDelta {
                center_offset: Point3::new(0.7, 0.0, -0.2),
                width_offset: 0.25,
                height_offset: -0.5,
            };
            let next = apply_box_delta(&b, &delta);
            assert_eq!(next.depth(), b.depth());
            assert_eq!(next.rotation(), b.rotation());
            assert!((next.z_range().span() - next.depth()).abs() < EPS);
            assert!((next.center().z - 2.8).abs() < EPS);
        }
    }

    #[test]
    fn apply_delta_offsets_in_box_frame() {
        let b = OrientedBox3D::new("b", Point3::ZERO, 1.0, 1.0, 1.0, FRAC_PI_2).unwrap();
        let delta = BoxDelta {
            center_offset: Point3::new(1.0, 0.0, 0.0),
            ..BoxDelta::default()
        };
        let next = apply_box_delta(&b, &delta);
        assert!(next.center().x.abs() < EPS);
        assert!((next.center().y - 1.0).abs() < EPS);
    }

    #[test]
    fn apply_delta_never_collapses_dimensions() {
        let b = box_a();
        let delta = BoxDelta {
            width_offset: -5.0,
            ..BoxDelta::default()
        };
        assert!(apply_box_delta(&b, &delta).width() > 0.0);
    }

    #[test]
    fn rotation_round_trip() {
        let mut b = OrientedBox3D::new("r", Point3::new(4.0, -2.0, 1.0), 3.0, 1.5, 2.0, 0.4).unwrap();
        b.set_footprint(box_footprint(&b));
        for angle in [0.1, 1.0, -2.5, 7.0] {
            let back = rotate_box(&rotate_box(&b, angle), -angle);
            assert!((back.rotation() - b.rotation()).abs() < EPS);
            for (p, q) in back.footprint().iter().zip(b.footprint()) {
                assert!((p.x - q.x).abs() < EPS && (p.y - q.y).abs() < EPS);
            }
        }
    }

    #[test]
    fn footprint_edges_match_dimensions() {
        let b = OrientedBox3D::new("f", Point3::new(1.0, 1.0, 0.0), 2.0, 4.0, 1.0, 0.9).unwrap();
        let fp = box_footprint(&b);
        assert!((line_length(fp[0], fp[1]) - 4.0).abs() < EPS);
        assert!((line_length(fp[1], fp[2]) - 2.0).abs() < EPS);
        assert!((polygon_area(&fp) - 8.0).abs() < EPS);
    }

    #[test]
    fn normalize_angle_range() {
        assert!((normalize_angle(TAU + 0.5) - 0.5).abs() < EPS);
        assert!((normalize_angle(PI + 0.5) - (0.5 - PI)).abs() < EPS);
        assert!((normalize_angle(-PI) - PI).abs() < EPS);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn kitti_metrics_and_inverse() {
        let b = OrientedBox3D::new("k", Point3::new(1.0, 2.0, 0.5), 2.0, 4.0, 1.0, 0.3).unwrap();
        let m = kitti_box_metrics(&b);
        assert_eq!((m.length, m.width, m.height), (2.0, 4.0, 1.0));
        assert!((m.rotation_y - (-0.3 - FRAC_PI_2)).abs() < EPS);

        let back = box_from_kitti("k", b.center(), &m).unwrap();
        assert_eq!((back.width(), back.height(), back.depth()), (2.0, 4.0, 1.0));
        assert!((back.rotation() - 0.3).abs() < EPS);
    }

    #[test]
    fn kitti_inverse_rejects_degenerate_size() {
        let m = KittiMetrics {
            length: 0.0,
            width: 1.0,
            height: 1.0,
            rotation_y: 0.0,
        };
        assert!(box_from_kitti("k", Point3::ZERO, &m).is_err());
    }
}
