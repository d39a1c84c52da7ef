//! Lifecycle notifications for constructed views.
//!
//! Two channels exist: a view being finalized after construction, and a
//! view's initial analysis completing. Listeners are appended for the life of
//! the bus and run synchronously, in registration order, on the thread that
//! drives the transition. A panicking listener is logged and skipped; the
//! remaining listeners still run.

use crate::core::view::BinaryView;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{error, trace};

/// Listener callback; receives its own handle to the view.
pub type ViewEventListener = dyn Fn(Arc<BinaryView>) + Send + Sync;

/// Lifecycle channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewEvent {
    Finalized,
    InitialAnalysisComplete,
}

impl fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewEvent::Finalized => write!(f, "finalized"),
            ViewEvent::InitialAnalysisComplete => write!(f, "initial_analysis_complete"),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    finalized: RwLock<Vec<Arc<ViewEventListener>>>,
    analysis_complete: RwLock<Vec<Arc<ViewEventListener>>>,
}

static GLOBAL_BUS: Lazy<Arc<EventBus>> = Lazy::new(|| Arc::new(EventBus::new()));

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bus used by the free registration functions.
    pub fn global() -> Arc<EventBus> {
        Arc::clone(&GLOBAL_BUS)
    }

    fn channel(&self, event: ViewEvent) -> &RwLock<Vec<Arc<ViewEventListener>>> {
        match event {
            ViewEvent::Finalized => &self.finalized,
            ViewEvent::InitialAnalysisComplete => &self.analysis_complete,
        }
    }

    /// Append a listener. Listeners are never removed.
    pub fn register<F>(&self, event: ViewEvent, listener: F)
    where
        F: Fn(Arc<BinaryView>) + Send + Sync + 'static,
    {
        let mut listeners = self.channel(event).write().unwrap_or_else(|e| e.into_inner());
        listeners.push(Arc::new(listener));
        trace!(%event, count = listeners.len(), "Registered view event listener");
    }

    pub fn listener_count(&self, event: ViewEvent) -> usize {
        self.channel(event)
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Invoke every listener registered so far. Returns how many completed
    /// without panicking.
    pub fn notify(&self, event: ViewEvent, view: &Arc<BinaryView>) -> usize {
        let listeners: Vec<Arc<ViewEventListener>> = self
            .channel(event)
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut completed = 0;
        for (position, listener) in listeners.iter().enumerate() {
            let handle = Arc::clone(view);
            match catch_unwind(AssertUnwindSafe(|| listener(handle))) {
                Ok(()) => completed += 1,
                Err(_) => {
                    error!(%event, position, view = %view.id(), "View event listener panicked");
                }
            }
        }
        trace!(%event, view = %view.id(), listeners = listeners.len(), completed, "Dispatched view event");
        completed
    }
}

/// Register a listener for view finalization on the global bus.
pub fn register_view_finalization_event<F>(listener: F)
where
    F: Fn(Arc<BinaryView>) + Send + Sync + 'static,
{
    GLOBAL_BUS.register(ViewEvent::Finalized, listener);
}

/// Register a listener for initial analysis completion on the global bus.
pub fn register_initial_analysis_completion_event<F>(listener: F)
where
    F: Fn(Arc<BinaryView>) + Send + Sync + 'static,
{
    GLOBAL_BUS.register(ViewEvent::InitialAnalysisComplete, listener);
}
