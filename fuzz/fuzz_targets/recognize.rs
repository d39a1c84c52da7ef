#![no_main]
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use std::sync::Arc;

use binview::events::EventBus;
use binview::formats::register_builtin_view_types;
use binview::recognition::RecognitionEngine;
use binview::viewtype::{ConstructionMode, ViewTypeRegistry};

static ENGINE: Lazy<RecognitionEngine> = Lazy::new(|| {
    let registry = Arc::new(ViewTypeRegistry::new());
    register_builtin_view_types(&registry).expect("builtin registration");
    RecognitionEngine::new(registry, Arc::new(EventBus::new()))
});

fuzz_target!(|data: &[u8]| {
    for mode in [ConstructionMode::Create, ConstructionMode::Parse] {
        // Raw accepts everything, so recognition must always succeed.
        let r = ENGINE.open_bytes(data.to_vec(), mode).expect("raw fallback");
        assert_eq!(r.view.len(), data.len() as u64);
    }
});
