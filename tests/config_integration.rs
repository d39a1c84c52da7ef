use binview::config::{BinviewConfig, RecognitionOptions};
use binview::events::EventBus;
use binview::recognition::RecognitionEngine;
use binview::viewtype::{ConstructionMode, ViewTypePlugin, ViewTypeRegistry};
use binview::{BinaryView, BinviewError};
use std::io::Write;
use std::sync::Arc;

struct Legacy;

impl ViewTypePlugin for Legacy {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        Some(BinaryView::builder("Legacy", data).build())
    }

    fn is_valid_for_data(&self, _data: &BinaryView) -> bool {
        true
    }

    fn is_deprecated(&self) -> bool {
        true
    }
}

fn engine_with(config: &BinviewConfig) -> RecognitionEngine {
    let registry = Arc::new(ViewTypeRegistry::new());
    registry.register("Legacy", "Legacy loader", Legacy).unwrap();
    RecognitionEngine::new(registry, Arc::new(EventBus::new())).with_config(config)
}

#[test]
fn test_config_defaults() {
    let config = BinviewConfig::default();
    assert_eq!(config.io.max_file_size, 512 * 1024 * 1024);
    assert_eq!(config.recognition, RecognitionOptions::default());
    assert_eq!(config.timeout.recognition_seconds, 60);
}

#[test]
fn test_config_from_file_drives_engine() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "recognition": { "include_deprecated": true, "parse_falls_back_to_create": true },
            "timeout": { "recognition_seconds": 5 }
        }"#,
    )
    .unwrap();

    let config = BinviewConfig::from_file(file.path()).unwrap();
    assert!(config.recognition.include_deprecated);
    assert!(config.recognition.resolve_platform);
    assert_eq!(config.timeout.recognition_seconds, 5);

    // Deprecated type is offered and Parse falls back to its Create.
    let engine = engine_with(&config);
    let r = engine
        .open_bytes(&b"anything"[..], ConstructionMode::Parse)
        .unwrap();
    assert_eq!(r.view_type.name(), "Legacy");

    let strict = engine_with(&BinviewConfig::default());
    assert!(strict
        .open_bytes(&b"anything"[..], ConstructionMode::Create)
        .is_err());
}

#[test]
fn test_config_errors() {
    assert!(matches!(
        BinviewConfig::from_json_str(r#"{"io": {"max_file_size": "big"}}"#),
        Err(BinviewError::Config(_))
    ));
    assert!(matches!(
        BinviewConfig::from_file("/nonexistent/binview.json"),
        Err(BinviewError::Io(_))
    ));
}
