use crate::common::fixtures::TestPlugin;
use crate::common::isolated_engine;
use binview::core::view::BinaryView;
use binview::io::ByteSource;
use binview::recognition::RecognitionError;
use binview::viewtype::{ConstructionMode, Priority};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn data(bytes: &'static [u8]) -> Arc<BinaryView> {
    BinaryView::raw(Arc::new(ByteSource::new(bytes)))
}

#[test]
fn elf_and_raw_selection() {
    let engine = isolated_engine();
    engine
        .registry()
        .register("ELF", "ELF", TestPlugin::new("ELF", b"\x7fELF"))
        .unwrap();
    engine
        .registry()
        .register(
            "RAW",
            "Raw",
            TestPlugin::new("RAW", b"").with_priority(Priority::FALLBACK),
        )
        .unwrap();

    let elf = engine
        .recognize(&data(b"\x7fELF\x02\x01\x01\x00"), ConstructionMode::Create)
        .unwrap();
    assert_eq!(elf.view_type.name(), "ELF");

    let raw = engine
        .recognize(&data(b"\x00\x01\x02"), ConstructionMode::Create)
        .unwrap();
    assert_eq!(raw.view_type.name(), "RAW");
}

#[test]
fn fallback_registered_first_still_loses() {
    let engine = isolated_engine();
    engine
        .registry()
        .register(
            "RAW",
            "Raw",
            TestPlugin::new("RAW", b"").with_priority(Priority::FALLBACK),
        )
        .unwrap();
    engine
        .registry()
        .register("ELF", "ELF", TestPlugin::new("ELF", b"\x7fELF"))
        .unwrap();

    let r = engine
        .recognize(&data(b"\x7fELF"), ConstructionMode::Parse)
        .unwrap();
    assert_eq!(r.view_type.name(), "ELF");
}

#[test]
fn names_round_trip() {
    let engine = isolated_engine();
    let pairs = [
        ("ELF", "Executable and Linkable Format"),
        ("PE", "Portable Executable"),
        ("Mach-O", "Mach Object"),
    ];
    for (name, long_name) in pairs {
        engine
            .registry()
            .register(name, long_name, TestPlugin::new("x", b"x"))
            .unwrap();
    }
    for (name, long_name) in pairs {
        let vt = engine.registry().get_by_name(name).unwrap();
        assert_eq!(vt.name(), name);
        assert_eq!(vt.long_name(), long_name);
    }
}

#[test]
fn list_applicable_is_probe_subset() {
    let engine = isolated_engine();
    let reg = engine.registry();
    reg.register("A", "A", TestPlugin::new("A", b"AB")).unwrap();
    reg.register("B", "B", TestPlugin::new("B", b"B")).unwrap();
    reg.register("C", "C", TestPlugin::new("C", b"A")).unwrap();
    reg.register("D", "D", TestPlugin::new("D", b"")).unwrap();

    let input = data(b"ABCD");
    let expected: Vec<String> = reg
        .list_all()
        .iter()
        .filter(|vt| vt.is_valid_for_data(&input))
        .map(|vt| vt.name().to_string())
        .collect();
    let applicable: Vec<String> = reg
        .list_applicable(&input)
        .iter()
        .map(|vt| vt.name().to_string())
        .collect();
    assert_eq!(applicable, expected);
    assert_eq!(applicable, vec!["A", "C", "D"]);
}

#[test]
fn non_matching_types_never_constructed() {
    let engine = isolated_engine();
    let pe = TestPlugin::new("PE", b"MZ");
    let pe_count = pe.counter();
    let macho = TestPlugin::new("Mach-O", b"\xcf\xfa\xed\xfe");
    let macho_count = macho.counter();
    let elf = TestPlugin::new("ELF", b"\x7fELF");
    let elf_count = elf.counter();
    engine.registry().register("PE", "PE", pe).unwrap();
    engine.registry().register("Mach-O", "Mach-O", macho).unwrap();
    engine.registry().register("ELF", "ELF", elf).unwrap();

    for mode in [ConstructionMode::Create, ConstructionMode::Parse] {
        engine.recognize(&data(b"\x7fELF"), mode).unwrap();
    }
    assert!(engine.recognize(&data(b"zzzz"), ConstructionMode::Create).is_err());

    assert_eq!(pe_count.load(Ordering::SeqCst), 0);
    assert_eq!(macho_count.load(Ordering::SeqCst), 0);
    assert_eq!(elf_count.load(Ordering::SeqCst), 2);
}

#[test]
fn deprecated_excluded_but_reachable_by_name() {
    let engine = isolated_engine();
    engine
        .registry()
        .register("OldELF", "Old ELF", TestPlugin::new("OldELF", b"\x7fELF").deprecated())
        .unwrap();

    let input = data(b"\x7fELF");
    assert!(engine.candidates(&input).is_empty());
    assert_eq!(
        engine.recognize(&input, ConstructionMode::Create).unwrap_err(),
        RecognitionError::NoApplicableType
    );

    let vt = engine.registry().get_by_name("OldELF").unwrap();
    assert!(vt.is_deprecated());
    let r = engine
        .open_with("OldELF", &input, ConstructionMode::Create)
        .unwrap();
    assert_eq!(r.view.view_type(), Some("OldELF"));
}

#[test]
fn all_candidates_declining_is_reportable() {
    let engine = isolated_engine();
    let first = TestPlugin::new("First", b"").declining();
    let first_count = first.counter();
    let second = TestPlugin::new("Second", b"").declining();
    let second_count = second.counter();
    engine.registry().register("First", "First", first).unwrap();
    engine.registry().register("Second", "Second", second).unwrap();

    let err = engine
        .recognize(&data(b"anything"), ConstructionMode::Create)
        .unwrap_err();
    assert_eq!(err, RecognitionError::NoApplicableType);
    assert_eq!(err.to_string(), "No applicable view type found");
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
}
