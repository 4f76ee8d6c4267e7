use crate::kernel::polygon_area;
use crate::GeomError;
use glam::DVec2;
use pc_core::{Footprint, Point2, Point3, ZRange};
use serde::{Deserialize, Serialize};

/// Points closer than this to a footprint edge count as inside.
const BOUNDARY_EPS: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCount {
    pub num: u64,
}

/// Read-only point cloud. Containment queries never mutate it, so it can be
/// shared behind an `Arc` across concurrent queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point3>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Builds a cloud from packed `x, y, z` triples.
    pub fn from_flat(coords: &[f64]) -> Result<Self, GeomError> {
        if coords.len() % 3 != 0 {
            return Err(GeomError::RaggedPointBuffer(coords.len()));
        }
        Ok(Self::new(
            coords
                .chunks_exact(3)
                .map(|c| Point3::new(c[0], c[1], c[2]))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn count_points_in_box(&self, footprint: &Footprint, z_range: ZRange) -> PointCount {
        let num = self.inside(footprint, z_range).count() as u64;
        PointCount { num }
    }

    pub fn filter_points_in_box(&self, footprint: &Footprint, z_range: ZRange) -> Vec<Point3> {
        self.inside(footprint, z_range).copied().collect()
    }

    fn inside<'a>(
        &'a self,
        footprint: &'a Footprint,
        z_range: ZRange,
    ) -> impl Iterator<Item = &'a Point3> + 'a {
        let degenerate = is_degenerate(footprint);
        let (min, max) = bounds(footprint);
        self.points.iter().filter(move |p| {
            !degenerate
                && z_range.contains(p.z)
                && p.x >= min.x - BOUNDARY_EPS
                && p.x <= max.x + BOUNDARY_EPS
                && p.y >= min.y - BOUNDARY_EPS
                && p.y <= max.y + BOUNDARY_EPS
                && point_in_polygon(Point2::new(p.x, p.y), footprint)
        })
    }
}

/// A footprint thinner than the boundary tolerance has no interior. The
/// threshold scales with the perimeter so tiny but real boxes still count.
fn is_degenerate(polygon: &[Point2]) -> bool {
    let perimeter: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| DVec2::from(*a).distance(DVec2::from(*b)))
        .sum();
    polygon_area(polygon) <= BOUNDARY_EPS * perimeter
}

fn bounds(polygon: &[Point2]) -> (DVec2, DVec2) {
    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for p in polygon {
        let v = DVec2::from(*p);
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

/// Ray-casting point-in-polygon test. Points on an edge are inside.
pub fn point_in_polygon(p: Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = polygon[i];
        let vj = polygon[j];

        if on_segment(p, vi, vj) {
            return true;
        }
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

fn on_segment(p: Point2, a: Point2, b: Point2) -> bool {
    let (p, a, b) = (DVec2::from(p), DVec2::from(a), DVec2::from(b));
    let ab = b - a;
    let ap = p - a;
    let len2 = ab.length_squared();
    if len2 <= BOUNDARY_EPS * BOUNDARY_EPS {
        return ap.length() <= BOUNDARY_EPS;
    }
    if ab.perp_dot(ap).abs() > BOUNDARY_EPS * len2.sqrt() {
        return false;
    }
    let t = ap.dot(ab);
    t >= -BOUNDARY_EPS && t <= len2 + BOUNDARY_EPS
}
