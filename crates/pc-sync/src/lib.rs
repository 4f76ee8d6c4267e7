//! Keeps the orthographic views and the box store consistent while the
//! annotator edits, with point counting running off the edit path.

mod config;
mod containment;
mod error;
mod orchestrator;
mod replay;

pub use config::SyncConfig;
pub use containment::{
    spawn_containment_worker, ContainmentEngine, CountChannel, CountRequest, CountResult,
    TaggedCount,
};
pub use error::SyncError;
pub use orchestrator::{Discard, EventOutcome, Notifier, ResultSink, SyncState, ViewSync};
pub use replay::{replay, CameraReport, ReplayReport, SessionLog};
