use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BoxId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<DVec2> for Point2 {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point2> for DVec2 {
    fn from(p: Point2) -> Self {
        DVec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<DVec3> for Point3 {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3> for DVec3 {
    fn from(p: Point3) -> Self {
        DVec3::new(p.x, p.y, p.z)
    }
}

/// Vertical extent of a box, always `center.z ± depth / 2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZRange {
    pub min_z: f64,
    pub max_z: f64,
}

impl ZRange {
    pub fn around(center_z: f64, depth: f64) -> Self {
        Self {
            min_z: center_z - depth / 2.0,
            max_z: center_z + depth / 2.0,
        }
    }

    pub fn contains(&self, z: f64) -> bool {
        z >= self.min_z && z <= self.max_z
    }

    pub fn span(&self) -> f64 {
        self.max_z - self.min_z
    }
}

pub type Footprint = [Point2; 4];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoxError {
    #[error("box id must not be empty")]
    EmptyId,
    #[error("box {id}: {field} must be positive and finite, got {value}")]
    InvalidDimension {
        id: BoxId,
        field: &'static str,
        value: f64,
    },
}

/// Canonical oriented cuboid. Geometry-changing setters keep `z_range` in
/// step with `center.z` and `depth`. Not serde-enabled: boxes cross the wire
/// as `BoxExport` and come back through the validating constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBox3D {
    id: BoxId,
    center: Point3,
    width: f64,
    height: f64,
    depth: f64,
    rotation: f64,
    z_range: ZRange,
    point_count: u64,
    footprint: Footprint,
}

impl OrientedBox3D {
    pub fn new(
        id: impl Into<BoxId>,
        center: Point3,
        width: f64,
        height: f64,
        depth: f64,
        rotation: f64,
    ) -> Result<Self, BoxError> {
        let id = id.into();
        if id.is_empty() {
            return Err(BoxError::EmptyId);
        }
        for (field, value) in [("width", width), ("height", height), ("depth", depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BoxError::InvalidDimension { id, field, value });
            }
        }
        Ok(Self {
            id,
            center,
            width,
            height,
            depth,
            rotation,
            z_range: ZRange::around(center.z, depth),
            point_count: 0,
            footprint: [Point2::ZERO; 4],
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn z_range(&self) -> ZRange {
        self.z_range
    }

    pub fn point_count(&self) -> u64 {
        self.point_count
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Moves and resizes the box. Non-positive sizes are clamped to
    /// `min_dimension`.
    pub fn set_geometry(&mut self, center: Point3, width: f64, height: f64, min_dimension: f64) {
        self.center = center;
        self.width = clamp_dimension(width, min_dimension);
        self.height = clamp_dimension(height, min_dimension);
        self.z_range = ZRange::around(center.z, self.depth);
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    pub fn set_footprint(&mut self, footprint: Footprint) {
        self.footprint = footprint;
    }

    pub fn set_point_count(&mut self, count: u64) {
        self.point_count = count;
    }
}

fn clamp_dimension(value: f64, min_dimension: f64) -> f64 {
    if value.is_finite() && value > min_dimension {
        value
    } else {
        min_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_box_derives_z_range() {
        let b = OrientedBox3D::new("a", Point3::new(1.0, 2.0, 3.0), 2.0, 4.0, 1.0, 0.0).unwrap();
        assert_eq!(b.z_range(), ZRange { min_z: 2.5, max_z: 3.5 });
        assert!((b.z_range().span() - b.depth()).abs() < 1e-9);
    }

    #[test]
    fn new_box_rejects_bad_dimensions() {
        let err = OrientedBox3D::new("a", Point3::ZERO, 0.0, 1.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, BoxError::InvalidDimension { field: "width", .. }));
        let err = OrientedBox3D::new("a", Point3::ZERO, 1.0, 1.0, f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, BoxError::InvalidDimension { field: "depth", .. }));
        assert_eq!(
            OrientedBox3D::new("", Point3::ZERO, 1.0, 1.0, 1.0, 0.0).unwrap_err(),
            BoxError::EmptyId
        );
    }

    #[test]
    fn set_geometry_keeps_z_range_and_clamps() {
        let mut b = OrientedBox3D::new("a", Point3::ZERO, 2.0, 4.0, 1.0, 0.0).unwrap();
        b.set_geometry(Point3::new(0.0, 0.0, 2.0), -1.0, 3.0, 1e-3);
        assert_eq!(b.width(), 1e-3);
        assert_eq!(b.height(), 3.0);
        assert_eq!(b.z_range(), ZRange { min_z: 1.5, max_z: 2.5 });
    }
}
