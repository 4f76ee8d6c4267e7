use pc_core::{BoxError, BoxId, Footprint, OrientedBox3D, Point3, ZRange};
use serde::{Deserialize, Serialize};

/// Box shape handed to the result store on every committed edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxExport {
    pub id: BoxId,
    pub center: Point3,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub rotation: f64,
    #[serde(rename = "zInfo")]
    pub z_info: ZRange,
    pub rect: Footprint,
    #[serde(default)]
    pub count: u64,
}

impl From<&OrientedBox3D> for BoxExport {
    fn from(cuboid: &OrientedBox3D) -> Self {
        Self {
            id: cuboid.id().to_string(),
            center: cuboid.center(),
            width: cuboid.width(),
            height: cuboid.height(),
            depth: cuboid.depth(),
            rotation: cuboid.rotation(),
            z_info: cuboid.z_range(),
            rect: *cuboid.footprint(),
            count: cuboid.point_count(),
        }
    }
}

/// `zInfo` is derived, so an incoming value is ignored and recomputed.
impl TryFrom<BoxExport> for OrientedBox3D {
    type Error = BoxError;

    fn try_from(export: BoxExport) -> Result<Self, Self::Error> {
        let mut cuboid = OrientedBox3D::new(
            export.id,
            export.center,
            export.width,
            export.height,
            export.depth,
            export.rotation,
        )?;
        cuboid.set_footprint(export.rect);
        cuboid.set_point_count(export.count);
        Ok(cuboid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::Point2;

    #[test]
    fn export_uses_external_field_names() {
        let mut cuboid = OrientedBox3D::new("a", Point3::new(0.0, 0.0, 1.0), 2.0, 4.0, 1.0, 0.0).unwrap();
        cuboid.set_point_count(12);
        let json = serde_json::to_value(BoxExport::from(&cuboid)).unwrap();
        assert_eq!(json["zInfo"]["minZ"], 0.5);
        assert_eq!(json["zInfo"]["maxZ"], 1.5);
        assert_eq!(json["count"], 12);
        assert_eq!(json["rect"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn import_recomputes_z_info() {
        let export = BoxExport {
            id: "b".to_string(),
            center: Point3::new(0.0, 0.0, 2.0),
            width: 1.0,
            height: 1.0,
            depth: 2.0,
            rotation: 0.0,
            z_info: ZRange { min_z: -100.0, max_z: 100.0 },
            rect: [Point2::ZERO; 4],
            count: 3,
        };
        let cuboid = OrientedBox3D::try_from(export).unwrap();
        assert_eq!(cuboid.z_range(), ZRange { min_z: 1.0, max_z: 3.0 });
        assert_eq!(cuboid.point_count(), 3);
    }

    #[test]
    fn import_rejects_flat_box() {
        let export = BoxExport {
            id: "c".to_string(),
            center: Point3::ZERO,
            width: 1.0,
            height: 1.0,
            depth: 0.0,
            rotation: 0.0,
            z_info: ZRange::default(),
            rect: [Point2::ZERO; 4],
            count: 0,
        };
        assert!(OrientedBox3D::try_from(export).is_err());
    }

    #[test]
    fn wire_boxes_must_hold_invariants() {
        let json = r#"{
            "id": "",
            "center": {"x": 0.0, "y": 0.0, "z": 5.0},
            "width": -1.0, "height": 1.0, "depth": 2.0, "rotation": 0.0,
            "zInfo": {"minZ": 5.0, "maxZ": 5.0},
            "rect": [{"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 0.0}]
        }"#;
        let export: BoxExport = serde_json::from_str(json).unwrap();
        assert_eq!(OrientedBox3D::try_from(export.clone()), Err(BoxError::EmptyId));

        let export = BoxExport {
            id: "d".to_string(),
            ..export
        };
        assert!(matches!(
            OrientedBox3D::try_from(export.clone()),
            Err(BoxError::InvalidDimension { field: "width", .. })
        ));

        let cuboid = OrientedBox3D::try_from(BoxExport { width: 1.0, ..export }).unwrap();
        assert_eq!(cuboid.z_range(), ZRange { min_z: 4.0, max_z: 6.0 });
    }
}
