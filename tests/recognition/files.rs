use crate::common::builtin_engine;
use crate::common::fixtures::elf64;
use crate::common::test_utils::{create_sized_temp_file, create_temp_file};
use binview::config::BinviewConfig;
use binview::io::error::IoError;
use binview::viewtype::ConstructionMode;
use binview::BinviewError;

#[test]
fn open_file_recognizes_elf() {
    let file = create_temp_file(&elf64(62, 9));
    let engine = builtin_engine();
    let r = engine.open_file(file.path(), ConstructionMode::Create).unwrap();
    assert_eq!(r.view_type.name(), "ELF");
    assert_eq!(r.view.platform().unwrap().name, "freebsd-x86_64");
    let parent = r.view.parent().unwrap();
    assert!(parent.source().description().contains(&*file.path().to_string_lossy()));
}

#[test]
fn open_empty_file_is_raw() {
    let file = create_temp_file(b"");
    let r = builtin_engine()
        .open_file(file.path(), ConstructionMode::Parse)
        .unwrap();
    assert_eq!(r.view_type.name(), "Raw");
    assert!(r.view.is_empty());
}

#[test]
fn open_file_respects_size_limit() {
    let file = create_sized_temp_file(4096, 0x90);
    let mut config = BinviewConfig::default();
    config.io.max_file_size = 1024;
    let engine = builtin_engine().with_config(&config);

    let err = engine
        .open_file(file.path(), ConstructionMode::Create)
        .unwrap_err();
    assert!(matches!(
        err,
        BinviewError::Io(IoError::FileTooLarge { limit: 1024, found: 4096 })
    ));
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = builtin_engine()
        .open_file(dir.path().join("missing.bin"), ConstructionMode::Create)
        .unwrap_err();
    assert!(matches!(err, BinviewError::Io(IoError::StdIo(_))));
}
