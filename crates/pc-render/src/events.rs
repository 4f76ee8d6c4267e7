use pc_protocol::{ViewEvent, ViewEventKind};
use std::collections::HashMap;

type Handler = Box<dyn FnMut(&ViewEvent)>;

/// Per-view event channel with at most one handler per event kind.
/// Registering again replaces the previous handler instead of stacking.
#[derive(Default)]
pub struct EventChannel {
    handlers: HashMap<ViewEventKind, Handler>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single_on(&mut self, kind: ViewEventKind, handler: impl FnMut(&ViewEvent) + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn off(&mut self, kind: ViewEventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches `event`; returns whether a handler ran.
    pub fn emit(&mut self, event: &ViewEvent) -> bool {
        match self.handlers.get_mut(&event.kind()) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}
