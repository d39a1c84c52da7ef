//! Recognition: choosing a view type for raw data and constructing the view.
//!
//! The engine probes every registered type, ranks the accepting ones by
//! priority (ties broken by registration order), and asks each candidate in
//! turn to construct a view until one succeeds. A declining candidate is not
//! an error; only running out of candidates is.
//!
//! Created views are associated with an architecture/platform through the
//! winning type's bindings and announced on the finalization channel.
//! Parsed views get the same association but are not finalized, since they
//! are not eligible for analysis.

use crate::config::{BinviewConfig, RecognitionOptions};
use crate::core::settings::Settings;
use crate::core::view::{BinaryView, ViewState};
use crate::events::{EventBus, ViewEvent};
use crate::io::{ByteSource, DataSource, IOLimits, MappedFile};
use crate::viewtype::{ConstructionMode, ViewType, ViewTypeRegistry};
use bytes::Bytes;
use std::cmp::Reverse;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Outcomes of recognition that are reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("No applicable view type found")]
    NoApplicableType,

    #[error("Unknown view type: {0}")]
    UnknownViewType(String),

    #[error("View type {name} declined to {mode} the data")]
    ConstructionDeclined {
        name: String,
        mode: ConstructionMode,
    },
}

/// A constructed view and the type that built it.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub view: Arc<BinaryView>,
    pub view_type: Arc<ViewType>,
    pub mode: ConstructionMode,
}

pub struct RecognitionEngine {
    registry: Arc<ViewTypeRegistry>,
    events: Arc<EventBus>,
    options: RecognitionOptions,
    limits: IOLimits,
}

impl RecognitionEngine {
    pub fn new(registry: Arc<ViewTypeRegistry>, events: Arc<EventBus>) -> Self {
        Self {
            registry,
            events,
            options: RecognitionOptions::default(),
            limits: IOLimits::default(),
        }
    }

    /// Engine over the process-wide registry and event bus.
    pub fn global() -> Self {
        Self::new(ViewTypeRegistry::global(), EventBus::global())
    }

    pub fn with_options(mut self, options: RecognitionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_config(mut self, config: &BinviewConfig) -> Self {
        self.options = config.recognition.clone();
        self.limits = config.io.limits();
        self
    }

    pub fn registry(&self) -> &Arc<ViewTypeRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn options(&self) -> &RecognitionOptions {
        &self.options
    }

    /// Order candidates: higher priority first, then registration order.
    /// Each plugin is asked for its priority once per ranking.
    pub fn rank(candidates: &mut [Arc<ViewType>]) {
        candidates.sort_by_cached_key(|vt| (Reverse(vt.priority()), vt.registration_index()));
    }

    /// Ranked view types eligible for auto-recognition of `data`.
    pub fn candidates(&self, data: &BinaryView) -> Vec<Arc<ViewType>> {
        let mut candidates: Vec<Arc<ViewType>> = self
            .registry
            .list_applicable(data)
            .into_iter()
            .filter(|vt| {
                let keep = self.options.include_deprecated || !vt.is_deprecated();
                if !keep {
                    debug!(view_type = %vt.name(), "Skipping deprecated view type");
                }
                keep
            })
            .collect();
        Self::rank(&mut candidates);
        candidates
    }

    /// Auto-recognize `data` and construct a view with the first candidate
    /// that accepts it.
    pub fn recognize(
        &self,
        data: &Arc<BinaryView>,
        mode: ConstructionMode,
    ) -> Result<Recognition, RecognitionError> {
        let span = crate::span_trace!(
            "recognize",
            source = %data.source().description(),
            mode = %mode
        );
        let _guard = span.enter();

        let candidates = self.candidates(data);
        if candidates.is_empty() {
            info!(len = data.len(), "No view type accepted the data");
            return Err(RecognitionError::NoApplicableType);
        }

        for view_type in candidates {
            match self.construct(&view_type, data, mode) {
                Some((view, built)) => return Ok(self.complete(view_type, view, built)),
                None => {
                    debug!(view_type = %view_type.name(), %mode, "Candidate declined; trying next");
                }
            }
        }

        warn!(len = data.len(), %mode, "Every candidate view type declined construction");
        Err(RecognitionError::NoApplicableType)
    }

    /// Construct with an explicitly named type, bypassing the validity probe
    /// and the deprecation filter.
    pub fn open_with(
        &self,
        name: &str,
        data: &Arc<BinaryView>,
        mode: ConstructionMode,
    ) -> Result<Recognition, RecognitionError> {
        let view_type = self
            .registry
            .get_by_name(name)
            .ok_or_else(|| RecognitionError::UnknownViewType(name.to_string()))?;
        let (view, built) = self.construct(&view_type, data, mode).ok_or_else(|| {
            RecognitionError::ConstructionDeclined {
                name: name.to_string(),
                mode,
            }
        })?;
        Ok(self.complete(view_type, view, built))
    }

    /// Auto-recognize an in-memory buffer.
    pub fn open_bytes(
        &self,
        bytes: impl Into<Bytes>,
        mode: ConstructionMode,
    ) -> crate::error::Result<Recognition> {
        let source: Arc<dyn DataSource> = Arc::new(ByteSource::new(bytes));
        Ok(self.recognize(&BinaryView::raw(source), mode)?)
    }

    /// Map a file and auto-recognize it.
    pub fn open_file<P: AsRef<Path>>(
        &self,
        path: P,
        mode: ConstructionMode,
    ) -> crate::error::Result<Recognition> {
        let source: Arc<dyn DataSource> = Arc::new(MappedFile::open(path, &self.limits)?);
        Ok(self.recognize(&BinaryView::raw(source), mode)?)
    }

    /// Load settings offered by the named type for `data`.
    pub fn load_settings(
        &self,
        name: &str,
        data: &BinaryView,
    ) -> Result<Option<Settings>, RecognitionError> {
        let view_type = self
            .registry
            .get_by_name(name)
            .ok_or_else(|| RecognitionError::UnknownViewType(name.to_string()))?;
        Ok(view_type.load_settings_for_data(data))
    }

    /// Report initial analysis of a finalized view as complete. Listeners run
    /// once per view; returns `false` if the view was not finalized or was
    /// already reported.
    pub fn complete_initial_analysis(&self, view: &Arc<BinaryView>) -> bool {
        if view.state() != ViewState::Finalized {
            debug!(view = %view.id(), state = ?view.state(), "View not eligible for analysis completion");
            return false;
        }
        if !view.advance_to(ViewState::AnalysisComplete) {
            return false;
        }
        self.events.notify(ViewEvent::InitialAnalysisComplete, view);
        true
    }

    /// Build a view, returning it with the mode that actually produced it.
    fn construct(
        &self,
        view_type: &ViewType,
        data: &Arc<BinaryView>,
        mode: ConstructionMode,
    ) -> Option<(Arc<BinaryView>, ConstructionMode)> {
        if let Some(view) = view_type.construct(mode, data) {
            return Some((view, mode));
        }
        if mode == ConstructionMode::Parse && self.options.parse_falls_back_to_create {
            debug!(view_type = %view_type.name(), "Parse declined; falling back to create");
            return view_type
                .create(data)
                .map(|view| (view, ConstructionMode::Create));
        }
        None
    }

    fn complete(
        &self,
        view_type: Arc<ViewType>,
        view: Arc<BinaryView>,
        mode: ConstructionMode,
    ) -> Recognition {
        if self.options.resolve_platform {
            view_type.resolve_platform(&view);
        }
        info!(
            view_type = %view_type.name(),
            %mode,
            view = %view.id(),
            platform = ?view.platform().map(|p| p.name.clone()),
            "Constructed view"
        );
        if mode == ConstructionMode::Create && view.advance_to(ViewState::Finalized) {
            self.events.notify(ViewEvent::Finalized, &view);
        }
        Recognition {
            view,
            view_type,
            mode,
        }
    }
}
