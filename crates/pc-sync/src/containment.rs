use crate::SyncError;
use futures_util::future::join_all;
use pc_core::{BoxId, Footprint, OrientedBox3D, ZRange};
use pc_geom::{PointCloud, PointCount};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// A count query tagged with the geometry generation it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRequest {
    pub id: BoxId,
    pub generation: u64,
    pub footprint: Footprint,
    pub z_range: ZRange,
}

impl CountRequest {
    pub fn for_box(cuboid: &OrientedBox3D, generation: u64) -> Self {
        Self {
            id: cuboid.id().to_string(),
            generation,
            footprint: *cuboid.footprint(),
            z_range: cuboid.z_range(),
        }
    }
}

/// `count` is `None` when the count task failed; the result still comes
/// back so the orchestrator can stop waiting for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResult {
    pub generation: u64,
    pub count: Option<PointCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCount {
    pub id: BoxId,
    pub result: CountResult,
}

/// Counts points off the edit path. The cloud is shared read-only, so any
/// number of counts may run at once.
#[derive(Debug, Clone)]
pub struct ContainmentEngine {
    cloud: Arc<PointCloud>,
}

impl ContainmentEngine {
    pub fn new(cloud: PointCloud) -> Self {
        Self {
            cloud: Arc::new(cloud),
        }
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub async fn count_points_in_box(
        &self,
        footprint: Footprint,
        z_range: ZRange,
    ) -> Result<PointCount, SyncError> {
        let cloud = Arc::clone(&self.cloud);
        let count =
            tokio::task::spawn_blocking(move || cloud.count_points_in_box(&footprint, z_range))
                .await?;
        Ok(count)
    }

    pub async fn count(&self, request: CountRequest) -> Result<TaggedCount, SyncError> {
        let count = self
            .count_points_in_box(request.footprint, request.z_range)
            .await?;
        Ok(TaggedCount {
            id: request.id,
            result: CountResult {
                generation: request.generation,
                count: Some(count),
            },
        })
    }

    pub async fn count_many(
        &self,
        requests: Vec<CountRequest>,
    ) -> Vec<Result<TaggedCount, SyncError>> {
        join_all(requests.into_iter().map(|request| self.count(request))).await
    }
}

/// Both ends of the orchestrator's link to the containment worker.
pub struct CountChannel {
    pub requests: mpsc::UnboundedSender<CountRequest>,
    pub results: mpsc::Receiver<TaggedCount>,
}

/// Starts the background worker. Each request is counted on its own task,
/// so results can come back in any order.
pub fn spawn_containment_worker(
    engine: ContainmentEngine,
    result_capacity: usize,
) -> (CountChannel, JoinHandle<()>) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = mpsc::channel(result_capacity.max(1));
    let handle = tokio::spawn(containment_worker(engine, request_rx, result_tx));
    (
        CountChannel {
            requests: request_tx,
            results: result_rx,
        },
        handle,
    )
}

async fn containment_worker(
    engine: ContainmentEngine,
    mut rx: mpsc::UnboundedReceiver<CountRequest>,
    respond_to: mpsc::Sender<TaggedCount>,
) {
    while let Some(request) = rx.recv().await {
        let engine = engine.clone();
        let respond_to = respond_to.clone();
        tokio::spawn(async move {
            let tagged = answer(&engine, request).await;
            let id = tagged.id.clone();
            if respond_to.send(tagged).await.is_err() {
                debug!(%id, "orchestrator gone, dropping point count");
            }
        });
    }
}

/// Counts `request`, turning a failed task into a failure-tagged result.
async fn answer(engine: &ContainmentEngine, request: CountRequest) -> TaggedCount {
    let id = request.id.clone();
    let generation = request.generation;
    match engine.count(request).await {
        Ok(tagged) => {
            trace!(%id, generation, "point count ready");
            tagged
        }
        Err(err) => {
            warn!(%id, generation, %err, "point count failed");
            TaggedCount {
                id,
                result: CountResult {
                    generation,
                    count: None,
                },
            }
        }
    }
}
