//! Common test utilities and helpers.

pub mod fixtures;
pub mod test_utils;

use binview::events::EventBus;
use binview::recognition::RecognitionEngine;
use binview::viewtype::ViewTypeRegistry;
use std::sync::Arc;

/// Engine over a fresh registry and bus.
pub fn isolated_engine() -> RecognitionEngine {
    RecognitionEngine::new(Arc::new(ViewTypeRegistry::new()), Arc::new(EventBus::new()))
}

/// Engine over a fresh registry populated with the built-in formats.
pub fn builtin_engine() -> RecognitionEngine {
    let engine = isolated_engine();
    binview::formats::register_builtin_view_types(engine.registry()).unwrap();
    engine
}
