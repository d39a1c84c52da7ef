//! Mach-O view type (thin images only).
//!
//! Identity: `arch_id` is `cputype`, `platform_id` is the `LC_BUILD_VERSION`
//! platform (0 when absent). Byte order follows the magic.

use super::{bind_arch, image_settings, read_u32, read_u64};
use crate::core::architecture::Platform;
use crate::core::binary::{Arch, Endianness};
use crate::core::settings::Settings;
use crate::core::view::{BinaryView, ViewIdentity};
use crate::viewtype::{ViewType, ViewTypePlugin};
use std::sync::Arc;

pub const NAME: &str = "Mach-O";
pub const LONG_NAME: &str = "Mach-O";

pub const MH_MAGIC: u32 = 0xfeed_face;
pub const MH_MAGIC_64: u32 = 0xfeed_facf;

pub const CPU_TYPE_X86: u32 = 7;
pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;
pub const CPU_TYPE_ARM: u32 = 12;
pub const CPU_TYPE_ARM64: u32 = 0x0100_000c;
pub const CPU_TYPE_POWERPC: u32 = 18;

pub const PLATFORM_MACOS: u32 = 1;
pub const PLATFORM_IOS: u32 = 2;

const LC_SEGMENT: u32 = 0x1;
const LC_SEGMENT_64: u32 = 0x19;
const LC_BUILD_VERSION: u32 = 0x32;
const LC_MAIN: u32 = 0x8000_0028;
const MAX_LOAD_COMMANDS: u32 = 1024;

/// Fields recovered from the Mach-O header and load commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachOHeaderInfo {
    pub is_64: bool,
    pub endianness: Endianness,
    pub cputype: u32,
    pub filetype: u32,
    pub ncmds: u32,
    pub text_vmaddr: Option<u64>,
    pub entry_offset: Option<u64>,
    pub build_platform: Option<u32>,
}

/// Word size and byte order from the magic.
pub fn magic(data: &[u8]) -> Option<(bool, Endianness)> {
    let raw = read_u32(data, 0, Endianness::Little)?;
    match raw {
        MH_MAGIC => Some((false, Endianness::Little)),
        MH_MAGIC_64 => Some((true, Endianness::Little)),
        _ if raw.swap_bytes() == MH_MAGIC => Some((false, Endianness::Big)),
        _ if raw.swap_bytes() == MH_MAGIC_64 => Some((true, Endianness::Big)),
        _ => None,
    }
}

/// Bounded header and load command walk. Load commands that run past the
/// data end the walk without failing the parse.
pub fn parse_header(data: &[u8]) -> Option<MachOHeaderInfo> {
    let (is_64, endian) = magic(data)?;
    let cputype = read_u32(data, 4, endian)?;
    let filetype = read_u32(data, 12, endian)?;
    let ncmds = read_u32(data, 16, endian)?;
    let mut info = MachOHeaderInfo {
        is_64,
        endianness: endian,
        cputype,
        filetype,
        ncmds,
        text_vmaddr: None,
        entry_offset: None,
        build_platform: None,
    };

    let mut offset: usize = if is_64 { 32 } else { 28 };
    for _ in 0..ncmds.min(MAX_LOAD_COMMANDS) {
        let (Some(cmd), Some(size)) = (read_u32(data, offset, endian), read_u32(data, offset + 4, endian)) else {
            break;
        };
        match cmd {
            LC_SEGMENT_64 | LC_SEGMENT => {
                let is_text = data
                    .get(offset + 8..offset + 24)
                    .map(|name| name.starts_with(b"__TEXT\0"))
                    .unwrap_or(false);
                if is_text && info.text_vmaddr.is_none() {
                    info.text_vmaddr = if cmd == LC_SEGMENT_64 {
                        read_u64(data, offset + 24, endian)
                    } else {
                        read_u32(data, offset + 24, endian).map(u64::from)
                    };
                }
            }
            LC_MAIN => info.entry_offset = read_u64(data, offset + 8, endian),
            LC_BUILD_VERSION => info.build_platform = read_u32(data, offset + 8, endian),
            _ => {}
        }
        if size < 8 {
            break;
        }
        match offset.checked_add(size as usize) {
            Some(next) => offset = next,
            None => break,
        }
    }
    Some(info)
}

pub struct MachOViewType;

impl MachOViewType {
    fn build(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        let header = parse_header(data.data())?;
        let image_base = header.text_vmaddr.unwrap_or(0);
        let mut builder = BinaryView::builder(NAME, data)
            .identity(ViewIdentity::new(
                header.cputype,
                header.build_platform.unwrap_or(0),
                header.endianness,
            ))
            .image_base(image_base)
            .metadata("macho.cputype", u64::from(header.cputype))
            .metadata("macho.filetype", u64::from(header.filetype))
            .metadata("macho.ncmds", u64::from(header.ncmds));
        if let Some(entry) = header.entry_offset {
            builder = builder.entry_point(image_base.wrapping_add(entry));
        }
        Some(builder.build())
    }
}

impl ViewTypePlugin for MachOViewType {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        magic(data.prefix(4)).is_some()
    }

    fn load_settings_for_data(&self, data: &BinaryView) -> Option<Settings> {
        let header = parse_header(data.data())?;
        let base = header.text_vmaddr.unwrap_or(0);
        Some(image_settings(
            base,
            base.wrapping_add(header.entry_offset.unwrap_or(0)),
        ))
    }
}

pub(crate) fn register_bindings(view_type: &ViewType) {
    let le = Endianness::Little;
    bind_arch(view_type, CPU_TYPE_X86, "x86", Arch::X86, le, "mac");
    bind_arch(view_type, CPU_TYPE_X86_64, "x86_64", Arch::X86_64, le, "mac");
    let armv7 = bind_arch(view_type, CPU_TYPE_ARM, "armv7", Arch::ARM, le, "mac");
    let aarch64 = bind_arch(view_type, CPU_TYPE_ARM64, "aarch64", Arch::AArch64, le, "mac");
    bind_arch(view_type, CPU_TYPE_POWERPC, "ppc", Arch::PPC, Endianness::Big, "mac");

    for arch in [&armv7, &aarch64] {
        let ios = Platform::shared(format!("ios-{}", arch.name), Arc::clone(arch));
        view_type.register_platform(PLATFORM_IOS, arch, ios);
    }
}
