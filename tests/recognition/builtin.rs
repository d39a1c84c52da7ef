use crate::common::builtin_engine;
use crate::common::fixtures::{elf64, macho32_be, pe32};
use binview::core::{Endianness, ViewIdentity, ViewState};
use binview::events::ViewEvent;
use binview::formats::{SETTING_ARCHITECTURE, SETTING_ENTRY_POINT, SETTING_IMAGE_BASE};
use binview::viewtype::ConstructionMode;
use std::sync::{Arc, Mutex};

#[test]
fn elf_header_selects_elf() {
    let engine = builtin_engine();
    let r = engine
        .open_bytes(elf64(62, 0), ConstructionMode::Create)
        .unwrap();
    assert_eq!(r.view_type.name(), "ELF");
    assert_eq!(r.view.platform().unwrap().name, "linux-x86_64");
    assert_eq!(r.view.architecture().unwrap().name, "x86_64");
    assert_eq!(r.view.entry_point(), Some(0x401000));
    assert_eq!(r.view.state(), ViewState::Finalized);
}

#[test]
fn pe_header_selects_pe() {
    let engine = builtin_engine();
    let r = engine
        .open_bytes(pe32(0x14c, 2), ConstructionMode::Parse)
        .unwrap();
    assert_eq!(r.view_type.name(), "PE");
    assert_eq!(
        r.view.identity(),
        Some(ViewIdentity::new(0x14c, 2, Endianness::Little))
    );
    assert_eq!(r.view.platform().unwrap().name, "windows-x86");
    assert_eq!(r.view.image_base(), 0x400000);
    assert_eq!(r.view.entry_point(), Some(0x401000));
    assert_eq!(r.view.state(), ViewState::Constructed);
}

#[test]
fn big_endian_macho_selects_ppc() {
    let engine = builtin_engine();
    let r = engine
        .open_bytes(macho32_be(18), ConstructionMode::Create)
        .unwrap();
    assert_eq!(r.view_type.name(), "Mach-O");
    assert_eq!(r.view.identity().unwrap().endianness, Endianness::Big);
    assert_eq!(r.view.platform().unwrap().name, "mac-ppc");
}

#[test]
fn unknown_machine_still_constructs() {
    let engine = builtin_engine();
    let r = engine
        .open_bytes(elf64(0x1234, 0), ConstructionMode::Create)
        .unwrap();
    assert_eq!(r.view_type.name(), "ELF");
    assert!(r.view.architecture().is_none());
    assert!(r.view.platform().is_none());
}

#[test]
fn malformed_headers_fall_back_to_raw() {
    let engine = builtin_engine();
    for input in [
        b"\x7fELF".to_vec(),
        b"MZ".to_vec(),
        vec![0xcf, 0xfa, 0xed, 0xfe, 0x07],
        vec![0x00, 0x01, 0x02],
        Vec::new(),
    ] {
        let r = engine
            .open_bytes(input.clone(), ConstructionMode::Create)
            .unwrap();
        assert_eq!(r.view_type.name(), "Raw", "input {:02x?}", input);
    }
}

#[test]
fn finalization_listeners_see_each_view_once() {
    let engine = builtin_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    engine.events().register(ViewEvent::Finalized, move |view| {
        s.lock().unwrap().push(view.view_type().unwrap_or("").to_string())
    });

    engine.open_bytes(elf64(183, 0), ConstructionMode::Create).unwrap();
    engine.open_bytes(pe32(0x14c, 3), ConstructionMode::Parse).unwrap();
    engine.open_bytes(vec![1, 2, 3], ConstructionMode::Create).unwrap();

    // Late listener is not replayed.
    let late = Arc::new(Mutex::new(0));
    let l = Arc::clone(&late);
    engine.events().register(ViewEvent::Finalized, move |_| *l.lock().unwrap() += 1);

    assert_eq!(*seen.lock().unwrap(), vec!["ELF", "Raw"]);
    assert_eq!(*late.lock().unwrap(), 0);
}

#[test]
fn load_settings_by_name() {
    let engine = builtin_engine();
    let elf = binview::BinaryView::raw(Arc::new(binview::ByteSource::new(elf64(62, 0))));

    let settings = engine.load_settings("ELF", &elf).unwrap().unwrap();
    assert_eq!(settings.get_u64(SETTING_ENTRY_POINT), Some(0x401000));
    assert!(settings.contains(SETTING_IMAGE_BASE));

    let raw = engine.load_settings("Raw", &elf).unwrap().unwrap();
    assert!(raw.contains(SETTING_ARCHITECTURE));

    assert!(engine.load_settings("PE", &elf).unwrap().is_none());
    assert!(engine.load_settings("COFF", &elf).is_err());
}
