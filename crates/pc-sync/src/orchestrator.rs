use crate::config::SyncConfig;
use crate::containment::{CountChannel, CountRequest, TaggedCount};
use pc_core::{BoxId, BoxStore, Footprint, OrientedBox3D, Selection, StoreError};
use pc_geom::{
    apply_box_delta, polygon_area, polygon_delta_to_box_delta, CuboidProjector, PointCount,
    TopDownProjector,
};
use pc_protocol::{box_infos, BoxExport, InfoRow, Notice, ViewEvent, ViewKind};
use pc_render::{sync_view_camera, ViewRegistry};
use std::collections::HashMap;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, trace, warn};

/// Receives the full box list after every committed edit.
pub trait ResultSink {
    fn save_results(&mut self, boxes: &[BoxExport]);
}

/// Shows transient messages to the user.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Collaborator that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl ResultSink for Discard {
    fn save_results(&mut self, _boxes: &[BoxExport]) {}
}

impl Notifier for Discard {
    fn notify(&mut self, _notice: Notice) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Tracking(BoxId),
    Editing(BoxId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    CameraSynced { moved: bool },
    DragStarted,
    Committed { id: BoxId, generation: u64 },
}

/// Turns view events into box store updates and fans the results back out
/// to every view.
pub struct ViewSync {
    config: SyncConfig,
    store: BoxStore,
    views: ViewRegistry,
    state: SyncState,
    projector: Box<dyn CuboidProjector>,
    sink: Box<dyn ResultSink>,
    notifier: Box<dyn Notifier>,
    counts: CountChannel,
    in_flight: usize,
    /// Latest generation per box whose count has not come back yet.
    awaiting: HashMap<BoxId, u64>,
    /// Boxes persisted before their count arrived; saved again once it does.
    unsaved: HashMap<BoxId, u64>,
}

impl ViewSync {
    pub fn new(config: SyncConfig, store: BoxStore, views: ViewRegistry, counts: CountChannel) -> Self {
        let mut sync = Self {
            config,
            store,
            views,
            state: SyncState::Idle,
            projector: Box::new(TopDownProjector),
            sink: Box::new(Discard),
            notifier: Box::new(Discard),
            counts,
            in_flight: 0,
            awaiting: HashMap::new(),
            unsaved: HashMap::new(),
        };
        sync.follow_selection();
        sync
    }

    pub fn with_projector(mut self, projector: impl CuboidProjector + 'static) -> Self {
        self.projector = Box::new(projector);
        self
    }

    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn store(&self) -> &BoxStore {
        &self.store
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn pending_counts(&self) -> usize {
        self.in_flight
    }

    pub fn select(&mut self, selection: impl Into<Selection>) {
        self.store.select(selection);
        self.follow_selection();
    }

    pub fn toggle(&mut self, id: &str) {
        self.store.toggle(id);
        self.follow_selection();
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
        self.follow_selection();
    }

    pub fn remove(&mut self, id: &str) -> Option<OrientedBox3D> {
        let removed = self.store.remove(id);
        if removed.is_some() {
            self.awaiting.remove(id);
            self.unsaved.remove(id);
            self.follow_selection();
            self.persist();
        }
        removed
    }

    /// Replaces the collection (frame switch) and queues fresh counts.
    /// Boxes arriving without a footprint get one from the projector.
    pub fn load_boxes(&mut self, boxes: Vec<OrientedBox3D>) {
        let boxes: Vec<OrientedBox3D> = boxes
            .into_iter()
            .map(|mut b| {
                if polygon_area(b.footprint()) == 0.0 {
                    b.set_footprint(self.projector.project_footprint(&b));
                }
                b
            })
            .collect();
        self.store.replace_all(boxes);
        self.awaiting.clear();
        self.unsaved.clear();
        self.follow_selection();
        self.refresh_counts();
    }

    /// Queues a count for every box in the store.
    pub fn refresh_counts(&mut self) {
        let requests: Vec<CountRequest> = self
            .store
            .boxes()
            .filter_map(|b| {
                self.store
                    .generation(b.id())
                    .map(|generation| CountRequest::for_box(b, generation))
            })
            .collect();
        for request in requests {
            self.request_count(request);
        }
    }

    pub fn copy(&mut self) -> Result<usize, StoreError> {
        let result = self.store.copy_selected();
        match &result {
            Ok(n) => info!(boxes = n, "copied selection"),
            Err(err) => self.report(err),
        }
        result
    }

    pub fn paste(&mut self) -> Result<Vec<BoxId>, StoreError> {
        let result = self.store.paste();
        match &result {
            Ok(ids) => {
                info!(boxes = ids.len(), "pasted boxes");
                let requests: Vec<CountRequest> = ids
                    .iter()
                    .filter_map(|id| {
                        let generation = self.store.generation(id)?;
                        self.store
                            .get(id)
                            .map(|b| CountRequest::for_box(b, generation))
                    })
                    .collect();
                for request in requests {
                    self.unsaved.insert(request.id.clone(), request.generation);
                    self.request_count(request);
                }
                self.persist();
            }
            Err(err) => self.report(err),
        }
        result
    }

    /// Presentation rows for the single selected box. The count row is left
    /// out while the count for its current geometry is still pending.
    pub fn selected_infos(&self) -> Option<Vec<InfoRow>> {
        self.store.selected().map(|b| {
            let count = (!self.count_pending(b.id())).then_some(PointCount {
                num: b.point_count(),
            });
            box_infos(b, count)
        })
    }

    /// Whether a count for the current generation of `id` is outstanding.
    pub fn count_pending(&self, id: &str) -> bool {
        match (self.awaiting.get(id), self.store.generation(id)) {
            (Some(pending), Some(current)) => *pending == current,
            _ => false,
        }
    }

    pub fn handle_event(&mut self, source: ViewKind, event: ViewEvent) -> EventOutcome {
        match event {
            ViewEvent::RenderZoom { zoom, current_pos } | ViewEvent::DragMove { current_pos, zoom } => {
                let selected = self.store.selected();
                let Some(view) = self.views.get_mut(source) else {
                    debug!(view = ?source, "event from unmounted view");
                    return EventOutcome::Ignored;
                };
                let moved = sync_view_camera(view, current_pos, zoom, selected);
                EventOutcome::CameraSynced { moved }
            }
            ViewEvent::PolygonDragStart => {
                if self.begin_polygon_drag() {
                    EventOutcome::DragStarted
                } else {
                    EventOutcome::Ignored
                }
            }
            ViewEvent::UpdatePolygonByDrag {
                new_polygon,
                origin_polygon,
            } => self.commit_polygon_drag(source, &new_polygon, &origin_polygon),
        }
    }

    /// `Tracking -> Editing`. Returns `false` unless a single box is tracked.
    pub fn begin_polygon_drag(&mut self) -> bool {
        let SyncState::Tracking(id) = &self.state else {
            return false;
        };
        let id = id.clone();
        self.state = SyncState::Editing(id);
        true
    }

    fn commit_polygon_drag(
        &mut self,
        source: ViewKind,
        new_polygon: &Footprint,
        origin_polygon: &Footprint,
    ) -> EventOutcome {
        let Some(selected) = self.store.selected().cloned() else {
            debug!(view = ?source, "polygon drag without a selected box, dropping");
            return EventOutcome::Ignored;
        };
        let id = selected.id().to_string();
        self.state = SyncState::Editing(id.clone());

        let delta = polygon_delta_to_box_delta(new_polygon, origin_polygon);
        let mut next = apply_box_delta(&selected, &delta);
        next.set_footprint(self.projector.project_footprint(&next));

        // Geometry first; the count for this generation follows.
        let generation = self.store.upsert(next.clone());
        self.request_count(CountRequest::for_box(&next, generation));
        if self.config.persist_on_commit {
            self.unsaved.insert(id.clone(), generation);
        }

        let skip = (!self.config.sync_source_view).then_some(source);
        let synced = self.views.sync_views_from_box(&next, skip);
        debug!(%id, generation, synced, ?delta, "committed polygon drag");

        if self.config.persist_on_commit {
            self.persist();
        }

        self.state = SyncState::Tracking(id.clone());
        EventOutcome::Committed { id, generation }
    }

    /// Applies every count that has already arrived. Returns how many were
    /// merged; stale ones are dropped.
    pub fn merge_counts(&mut self) -> usize {
        let mut merged = 0;
        loop {
            match self.counts.results.try_recv() {
                Ok(tagged) => {
                    if self.apply_count(tagged) {
                        merged += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        merged
    }

    /// Waits for the next count. `None` when nothing is pending.
    pub async fn next_count(&mut self) -> Option<bool> {
        if self.in_flight == 0 {
            return None;
        }
        let tagged = self.counts.results.recv().await?;
        Some(self.apply_count(tagged))
    }

    /// Waits until every queued count has come back.
    pub async fn settle(&mut self) {
        while self.next_count().await.is_some() {}
    }

    fn apply_count(&mut self, tagged: TaggedCount) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let TaggedCount { id, result } = tagged;
        let generation = result.generation;
        if self.awaiting.get(&id) == Some(&generation) {
            self.awaiting.remove(&id);
        }
        let settled_unsaved = self.unsaved.get(&id) == Some(&generation);
        if settled_unsaved {
            self.unsaved.remove(&id);
        }

        let Some(count) = result.count else {
            debug!(%id, generation, "point count failed, keeping previous value");
            return false;
        };
        let applied = self.store.apply_point_count(&id, generation, count.num);
        if applied {
            trace!(%id, num = count.num, "point count merged");
            if settled_unsaved {
                self.persist();
            }
        } else {
            trace!(%id, generation, "stale point count discarded");
        }
        applied
    }

    fn request_count(&mut self, request: CountRequest) {
        let id = request.id.clone();
        let generation = request.generation;
        if self.counts.requests.send(request).is_ok() {
            self.in_flight += 1;
            self.awaiting.insert(id, generation);
        } else {
            warn!(%id, "containment worker gone, point count skipped");
        }
    }

    fn follow_selection(&mut self) {
        let next = match self.store.selected_id() {
            Some(id) => SyncState::Tracking(id.to_string()),
            None => SyncState::Idle,
        };
        if next == self.state {
            return;
        }
        if let (SyncState::Tracking(id), Some(selected)) = (&next, self.store.selected()) {
            debug!(%id, "tracking selected box");
            self.views.sync_views_from_box(selected, None);
        }
        self.state = next;
    }

    fn persist(&mut self) {
        let boxes: Vec<BoxExport> = self
            .store
            .sorted_boxes()
            .into_iter()
            .map(BoxExport::from)
            .collect();
        self.sink.save_results(&boxes);
    }

    fn report(&mut self, err: &StoreError) {
        warn!(%err, "clipboard operation aborted");
        self.notifier.notify(Notice::from(err));
    }
}
