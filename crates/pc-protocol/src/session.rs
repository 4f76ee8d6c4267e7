use crate::{BoxExport, ViewEvent, ViewKind};
use pc_core::{BoxId, Point3};
use pc_geom::ViewSize;
use serde::{Deserialize, Serialize};

/// A recorded annotation session: the cloud, the starting boxes, the mounted
/// views and the edits to replay against them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub points: Vec<Point3>,
    #[serde(default)]
    pub boxes: Vec<BoxExport>,
    #[serde(default)]
    pub views: Vec<ViewSpec>,
    #[serde(default)]
    pub steps: Vec<SessionStep>,
    /// Annotation validity flag; only an explicit `false` marks it invalid.
    #[serde(default)]
    pub valid: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub kind: ViewKind,
    #[serde(default)]
    pub size: Option<ViewSize>,
    #[serde(default)]
    pub camera_position: Point3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionStep {
    Select { ids: Vec<BoxId> },
    Toggle { id: BoxId },
    SelectAll,
    Copy,
    Paste,
    Remove { id: BoxId },
    View { view: ViewKind, event: ViewEvent },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_session() {
        let json = r#"{
            "points": [{"x": 0.0, "y": 0.0, "z": 0.0}],
            "views": [{"kind": "back", "size": {"width": 200.0, "height": 100.0}}],
            "steps": [
                {"op": "select", "ids": ["a"]},
                {"op": "view", "view": "back",
                 "event": {"type": "render_zoom", "zoom": 2.0, "current_pos": {"x": 1.0, "y": 1.0}}},
                {"op": "copy"}
            ]
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.points.len(), 1);
        assert!(session.boxes.is_empty());
        assert_eq!(session.views[0].camera_position, Point3::ZERO);
        assert_eq!(session.steps.len(), 3);
        assert_eq!(session.steps[2], SessionStep::Copy);
    }

    #[test]
    fn step_roundtrip() {
        let step = SessionStep::View {
            view: ViewKind::Top,
            event: ViewEvent::PolygonDragStart,
        };
        let json = serde_json::to_string(&step).unwrap();
        let back: SessionStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, back);
    }
}
