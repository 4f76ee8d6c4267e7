//! Plain-data shapes exchanged between the views, the orchestrator and the
//! collaborators that persist or display results.

mod export;
mod info;
mod session;

use pc_core::{Footprint, Point2, StoreError};
use serde::{Deserialize, Serialize};

pub use export::BoxExport;
pub use info::{box_infos, view_size_info, InfoLabel, InfoRow, DECIMAL_PLACES};
pub use pc_geom::KittiMetrics;
pub use session::{Session, SessionStep, ViewSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Main,
    Top,
    Side,
    Back,
}

impl ViewKind {
    pub const ORTHOGRAPHIC: [ViewKind; 3] = [ViewKind::Top, ViewKind::Side, ViewKind::Back];
}

/// Events a 2D view emits while the user pans, zooms or drags a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    RenderZoom {
        zoom: f64,
        current_pos: Option<Point2>,
    },
    DragMove {
        current_pos: Option<Point2>,
        zoom: f64,
    },
    PolygonDragStart,
    UpdatePolygonByDrag {
        new_polygon: Footprint,
        origin_polygon: Footprint,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewEventKind {
    RenderZoom,
    DragMove,
    PolygonDragStart,
    UpdatePolygonByDrag,
}

impl ViewEventKind {
    pub const ALL: [ViewEventKind; 4] = [
        ViewEventKind::RenderZoom,
        ViewEventKind::DragMove,
        ViewEventKind::PolygonDragStart,
        ViewEventKind::UpdatePolygonByDrag,
    ];
}

impl ViewEvent {
    pub fn kind(&self) -> ViewEventKind {
        match self {
            ViewEvent::RenderZoom { .. } => ViewEventKind::RenderZoom,
            ViewEvent::DragMove { .. } => ViewEventKind::DragMove,
            ViewEvent::PolygonDragStart => ViewEventKind::PolygonDragStart,
            ViewEvent::UpdatePolygonByDrag { .. } => ViewEventKind::UpdatePolygonByDrag,
        }
    }
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub code: String,
    pub message: String,
}

impl From<&StoreError> for Notice {
    fn from(err: &StoreError) -> Self {
        let code = match err {
            StoreError::NothingToCopy => "copy_empty",
            StoreError::NothingToPaste => "paste_empty",
            StoreError::DuplicateId(_) => "duplicate_id",
        };
        Notice {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}
