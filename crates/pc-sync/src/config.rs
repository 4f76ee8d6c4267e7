/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Buffered point-count results before the worker waits on the view.
    pub count_result_capacity: usize,
    /// Hand the full box list to the result sink after every commit.
    pub persist_on_commit: bool,
    /// Also re-project the view the edit came from.
    pub sync_source_view: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            count_result_capacity: 64,
            persist_on_commit: true,
            sync_source_view: false,
        }
    }
}
