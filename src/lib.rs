//! binview: a pluggable binary-format recognition and view-construction
//! registry.
//!
//! Format plugins register a [`ViewTypePlugin`] under a unique name. Given raw
//! data, the [`RecognitionEngine`] probes every registered type, ranks the
//! accepting ones by priority, constructs a typed [`BinaryView`] with the
//! first one that succeeds, associates it with an architecture and platform
//! through the type's bindings, and announces the view on the [`EventBus`].

/// Core data types module
pub mod core;

/// Configuration structures
pub mod config;

/// Error types
pub mod error;

/// View lifecycle notifications
pub mod events;

/// Built-in ELF, PE, Mach-O and Raw view types
#[cfg(feature = "builtin-formats")]
pub mod formats;

/// IL-based function recognizers
pub mod function_recognizer;

/// Data sources
pub mod io;

/// Tracing setup and logging macros
pub mod logging;

/// Recognition engine
pub mod recognition;

/// Caller-side time bounds
pub mod timeout;

/// View type registry, plugin contract and bindings
pub mod viewtype;

pub use crate::config::BinviewConfig;
pub use crate::core::{
    Arch, Architecture, BinaryView, Endianness, Metadata, MetadataValue, Platform, Settings,
    ViewIdentity, ViewState,
};
pub use crate::error::{BinviewError, Result};
pub use crate::events::{
    register_initial_analysis_completion_event, register_view_finalization_event, EventBus,
    ViewEvent,
};
pub use crate::function_recognizer::{FunctionRecognizer, FunctionRecognizers};
pub use crate::io::{ByteSource, DataSource, MappedFile};
pub use crate::recognition::{Recognition, RecognitionEngine, RecognitionError};
pub use crate::viewtype::{
    ConstructionMode, Priority, RegistryError, ViewType, ViewTypePlugin, ViewTypeRegistry,
};
