use crate::config::SyncConfig;
use crate::containment::{spawn_containment_worker, ContainmentEngine};
use crate::orchestrator::{Notifier, ResultSink, ViewSync};
use crate::SyncError;
use pc_core::{BoxStore, OrientedBox3D, Point3};
use pc_geom::PointCloud;
use pc_protocol::{BoxExport, Notice, Session, SessionStep, ViewEvent, ViewEventKind, ViewKind};
use pc_render::{EventChannel, OrthoViewport, ViewRegistry};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, info, trace};

type Inbox = Rc<RefCell<VecDeque<(ViewKind, ViewEvent)>>>;

/// Event channel for one mounted view; every event kind lands in `inbox`
/// tagged with the view it came from.
fn subscribe(kind: ViewKind, inbox: &Inbox) -> EventChannel {
    let mut channel = EventChannel::new();
    for event_kind in ViewEventKind::ALL {
        let inbox = Rc::clone(inbox);
        channel.single_on(event_kind, move |event| {
            inbox.borrow_mut().push_back((kind, event.clone()));
        });
    }
    channel
}

#[derive(Debug, Default)]
struct LogState {
    saves: usize,
    last_saved: Vec<BoxExport>,
    notices: Vec<Notice>,
}

/// Result sink and notifier that keeps everything in memory. Clones share
/// the same log.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    inner: Rc<RefCell<LogState>>,
}

impl SessionLog {
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }

    pub fn last_saved(&self) -> Vec<BoxExport> {
        self.inner.borrow().last_saved.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.inner.borrow().notices.clone()
    }
}

impl ResultSink for SessionLog {
    fn save_results(&mut self, boxes: &[BoxExport]) {
        let mut state = self.inner.borrow_mut();
        state.saves += 1;
        state.last_saved = boxes.to_vec();
    }
}

impl Notifier for SessionLog {
    fn notify(&mut self, notice: Notice) {
        info!(code = %notice.code, "{}", notice.message);
        self.inner.borrow_mut().notices.push(notice);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    pub view: ViewKind,
    pub position: Point3,
    pub zoom: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub boxes: Vec<BoxExport>,
    pub selected: Option<String>,
    pub cameras: Vec<CameraReport>,
    pub notices: Vec<Notice>,
    pub saves: usize,
    pub valid: bool,
}

/// Runs a recorded session to completion, including every point count it
/// triggers.
pub async fn replay(session: Session, config: SyncConfig) -> Result<ReplayReport, SyncError> {
    let engine = ContainmentEngine::new(PointCloud::new(session.points));
    let (counts, worker) = spawn_containment_worker(engine, config.count_result_capacity);

    let inbox = Inbox::default();
    let mut channels = BTreeMap::new();
    let mut views = ViewRegistry::new();
    for mounted in session.views {
        channels.insert(mounted.kind, subscribe(mounted.kind, &inbox));
        let mut view = OrthoViewport::new(mounted.kind, mounted.camera_position);
        if let Some(size) = mounted.size {
            view.resize(size);
        }
        views.mount(Box::new(view));
    }

    let boxes = session
        .boxes
        .into_iter()
        .map(OrientedBox3D::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut store = BoxStore::new();
    store.set_valid(session.valid);

    let log = SessionLog::default();
    let mut sync = ViewSync::new(config, store, views, counts)
        .with_sink(log.clone())
        .with_notifier(log.clone());
    sync.load_boxes(boxes);

    for (index, step) in session.steps.into_iter().enumerate() {
        debug!(index, ?step, "replaying step");
        match step {
            SessionStep::Select { ids } => sync.select(ids),
            SessionStep::Toggle { id } => sync.toggle(&id),
            SessionStep::SelectAll => sync.select_all(),
            // Clipboard failures already reached the log as notices.
            SessionStep::Copy => {
                let _ = sync.copy();
            }
            SessionStep::Paste => {
                let _ = sync.paste();
            }
            SessionStep::Remove { id } => {
                sync.remove(&id);
            }
            SessionStep::View { view, event } => {
                let delivered = channels
                    .get_mut(&view)
                    .is_some_and(|channel| channel.emit(&event));
                if !delivered {
                    debug!(?view, "no view subscribed, dropping event");
                }
                let queued: Vec<_> = inbox.borrow_mut().drain(..).collect();
                for (source, event) in queued {
                    let outcome = sync.handle_event(source, event);
                    trace!(view = ?source, ?outcome, "view event handled");
                }
            }
        }
        sync.merge_counts();
    }
    sync.settle().await;
    worker.abort();

    let cameras = sync
        .views()
        .kinds()
        .filter_map(|kind| sync.views().get(kind).map(|v| (kind, *v.camera())))
        .map(|(view, camera)| CameraReport {
            view,
            position: camera.position(),
            zoom: camera.zoom,
        })
        .collect();

    Ok(ReplayReport {
        boxes: sync
            .store()
            .sorted_boxes()
            .into_iter()
            .map(BoxExport::from)
            .collect(),
        selected: sync.store().selected_id().map(str::to_string),
        cameras,
        notices: log.notices(),
        saves: log.saves(),
        valid: sync.store().is_valid(),
    })
}
