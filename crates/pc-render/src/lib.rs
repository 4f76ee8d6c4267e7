//! View-side state: per-view orthographic cameras, the camera sync that
//! keeps them on the selected box, and event plumbing.

mod camera;
mod events;
mod view;

pub use camera::{sync_camera_to_canvas_edit, ViewCameraState};
pub use events::EventChannel;
pub use view::{sync_view_camera, view_polygon, OrthoView, OrthoViewport, ViewRegistry};
