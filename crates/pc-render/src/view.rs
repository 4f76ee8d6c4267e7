use crate::camera::{sync_camera_to_canvas_edit, ViewCameraState};
use pc_core::{Footprint, OrientedBox3D, Point2, Point3};
use pc_geom::{box_footprint, ViewSize};
use pc_protocol::ViewKind;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A mounted view as seen by the orchestrator. Views own their camera and
/// never write to the box store.
pub trait OrthoView {
    fn kind(&self) -> ViewKind;

    /// `None` until the view has been laid out.
    fn size(&self) -> Option<ViewSize>;

    fn camera(&self) -> &ViewCameraState;

    fn camera_mut(&mut self) -> &mut ViewCameraState;

    /// Re-adds the selected render object, recomputes the projection and
    /// requests a redraw.
    fn refresh(&mut self);

    /// Re-projects the view from a freshly committed box.
    fn sync_views_from_box(&mut self, cuboid: &OrientedBox3D);
}

/// Camera sync for a whole view: reads its size, moves its camera and
/// refreshes it. Skipped while the view is unmeasured.
pub fn sync_view_camera(
    view: &mut dyn OrthoView,
    current_pos: Option<Point2>,
    zoom: f64,
    selected: Option<&OrientedBox3D>,
) -> bool {
    let Some(size) = view.size() else {
        debug!(view = ?view.kind(), "view size not measured yet, skipping camera sync");
        return false;
    };
    if !sync_camera_to_canvas_edit(current_pos, zoom, size, selected, view.camera_mut()) {
        return false;
    }
    view.refresh();
    true
}

/// The polygon a view draws for `cuboid`, in that view's 2D coordinates.
/// Vertex order matches [`box_footprint`]: height edge first, width edge
/// second.
pub fn view_polygon(kind: ViewKind, cuboid: &OrientedBox3D) -> Footprint {
    let z = cuboid.z_range();
    let across = match kind {
        ViewKind::Top | ViewKind::Main => return box_footprint(cuboid),
        ViewKind::Back => cuboid.width() / 2.0,
        ViewKind::Side => cuboid.height() / 2.0,
    };
    [
        Point2::new(-across, z.min_z),
        Point2::new(-across, z.max_z),
        Point2::new(across, z.max_z),
        Point2::new(across, z.min_z),
    ]
}

/// Headless view: tracks camera state, the polygon it would draw and how
/// often it was asked to redraw.
#[derive(Debug, Clone)]
pub struct OrthoViewport {
    kind: ViewKind,
    size: Option<ViewSize>,
    camera: ViewCameraState,
    polygon: Option<Footprint>,
    synced_box: Option<OrientedBox3D>,
    refresh_count: u64,
}

impl OrthoViewport {
    pub fn new(kind: ViewKind, reference_position: Point3) -> Self {
        Self {
            kind,
            size: None,
            camera: ViewCameraState::new(reference_position),
            polygon: None,
            synced_box: None,
            refresh_count: 0,
        }
    }

    pub fn with_size(mut self, size: ViewSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn resize(&mut self, size: ViewSize) {
        self.size = Some(size);
    }

    pub fn polygon(&self) -> Option<&Footprint> {
        self.polygon.as_ref()
    }

    pub fn synced_box(&self) -> Option<&OrientedBox3D> {
        self.synced_box.as_ref()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }
}

impl OrthoView for OrthoViewport {
    fn kind(&self) -> ViewKind {
        self.kind
    }

    fn size(&self) -> Option<ViewSize> {
        self.size
    }

    fn camera(&self) -> &ViewCameraState {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut ViewCameraState {
        &mut self.camera
    }

    fn refresh(&mut self) {
        self.refresh_count += 1;
        trace!(view = ?self.kind, refreshes = self.refresh_count, "view refreshed");
    }

    fn sync_views_from_box(&mut self, cuboid: &OrientedBox3D) {
        self.polygon = Some(view_polygon(self.kind, cuboid));
        self.synced_box = Some(cuboid.clone());
        self.refresh();
    }
}

/// Views currently mounted, at most one per kind. Mounting a kind again
/// replaces the previous view, dropping its camera.
#[derive(Default)]
pub struct ViewRegistry {
    views: BTreeMap<ViewKind, Box<dyn OrthoView>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, view: Box<dyn OrthoView>) -> Option<Box<dyn OrthoView>> {
        debug!(view = ?view.kind(), "mounting view");
        self.views.insert(view.kind(), view)
    }

    pub fn unmount(&mut self, kind: ViewKind) -> Option<Box<dyn OrthoView>> {
        debug!(view = ?kind, "unmounting view");
        self.views.remove(&kind)
    }

    pub fn get(&self, kind: ViewKind) -> Option<&dyn OrthoView> {
        self.views.get(&kind).map(|v| v.as_ref())
    }

    pub fn get_mut(&mut self, kind: ViewKind) -> Option<&mut (dyn OrthoView + 'static)> {
        self.views.get_mut(&kind).map(|v| v.as_mut())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.views.keys().copied()
    }

    /// Pushes a committed box to every view except `source`.
    pub fn sync_views_from_box(&mut self, cuboid: &OrientedBox3D, source: Option<ViewKind>) -> usize {
        let mut synced = 0;
        for (kind, view) in self.views.iter_mut() {
            if Some(*kind) == source {
                continue;
            }
            view.sync_views_from_box(cuboid);
            synced += 1;
        }
        synced
    }
}
