//! PE/COFF view type.
//!
//! Identity: `arch_id` is `IMAGE_FILE_HEADER.Machine`, `platform_id` is the
//! optional header `Subsystem`. PE images are always little-endian.

use super::{bind_arch, image_settings, read_u16, read_u32, read_u64};
use crate::core::architecture::Platform;
use crate::core::binary::{Arch, Endianness};
use crate::core::settings::Settings;
use crate::core::view::{BinaryView, ViewIdentity};
use crate::viewtype::{ViewType, ViewTypePlugin};
use std::sync::Arc;

pub const NAME: &str = "PE";
pub const LONG_NAME: &str = "PE/COFF";

pub const IMAGE_FILE_MACHINE_I386: u32 = 0x14c;
pub const IMAGE_FILE_MACHINE_ARM: u32 = 0x1c0;
pub const IMAGE_FILE_MACHINE_ARMNT: u32 = 0x1c4;
pub const IMAGE_FILE_MACHINE_AMD64: u32 = 0x8664;
pub const IMAGE_FILE_MACHINE_ARM64: u32 = 0xaa64;

pub const IMAGE_SUBSYSTEM_WINDOWS_GUI: u32 = 2;
pub const IMAGE_SUBSYSTEM_WINDOWS_CUI: u32 = 3;
pub const IMAGE_SUBSYSTEM_EFI_APPLICATION: u32 = 10;
pub const IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER: u32 = 11;
pub const IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER: u32 = 12;

const PE32_MAGIC: u16 = 0x10b;
const PE32_PLUS_MAGIC: u16 = 0x20b;
// e_lfanew beyond this is treated as corrupt.
const MAX_LFANEW: u32 = 0x10000;

/// Fields recovered from the DOS stub, COFF header and optional header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeHeaderInfo {
    pub nt_offset: usize,
    pub machine: u16,
    pub characteristics: u16,
    pub is_pe32_plus: bool,
    pub entry_rva: u32,
    pub image_base: u64,
    pub subsystem: u16,
}

/// Offset of the `PE\0\0` signature if `data` carries a DOS header pointing
/// at one.
pub fn nt_header_offset(data: &[u8]) -> Option<usize> {
    if data.get(..2)? != b"MZ" {
        return None;
    }
    let lfanew = read_u32(data, 0x3c, Endianness::Little)?;
    if lfanew > MAX_LFANEW {
        return None;
    }
    let offset = usize::try_from(lfanew).ok()?;
    (data.get(offset..offset.checked_add(4)?)? == b"PE\0\0").then_some(offset)
}

/// Bounded header read. `None` if any header is truncated or the optional
/// header magic is unknown.
pub fn parse_header(data: &[u8]) -> Option<PeHeaderInfo> {
    let le = Endianness::Little;
    let nt = nt_header_offset(data)?;
    let coff = nt + 4;
    let machine = read_u16(data, coff, le)?;
    let optional_size = read_u16(data, coff + 16, le)?;
    let characteristics = read_u16(data, coff + 18, le)?;
    if optional_size == 0 {
        return None;
    }

    let opt = coff + 20;
    let is_pe32_plus = match read_u16(data, opt, le)? {
        PE32_MAGIC => false,
        PE32_PLUS_MAGIC => true,
        _ => return None,
    };
    let entry_rva = read_u32(data, opt + 16, le)?;
    let image_base = if is_pe32_plus {
        read_u64(data, opt + 24, le)?
    } else {
        u64::from(read_u32(data, opt + 28, le)?)
    };
    let subsystem = read_u16(data, opt + 68, le)?;

    Some(PeHeaderInfo {
        nt_offset: nt,
        machine,
        characteristics,
        is_pe32_plus,
        entry_rva,
        image_base,
        subsystem,
    })
}

pub struct PeViewType;

impl PeViewType {
    fn build(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        let header = parse_header(data.data())?;
        Some(
            BinaryView::builder(NAME, data)
                .identity(ViewIdentity::new(
                    u32::from(header.machine),
                    u32::from(header.subsystem),
                    Endianness::Little,
                ))
                .entry_point(header.image_base.wrapping_add(u64::from(header.entry_rva)))
                .image_base(header.image_base)
                .metadata("pe.machine", u64::from(header.machine))
                .metadata("pe.subsystem", u64::from(header.subsystem))
                .metadata("pe.pe32_plus", header.is_pe32_plus)
                .metadata("pe.characteristics", u64::from(header.characteristics))
                .build(),
        )
    }
}

impl ViewTypePlugin for PeViewType {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        nt_header_offset(data.data()).is_some()
    }

    fn load_settings_for_data(&self, data: &BinaryView) -> Option<Settings> {
        let header = parse_header(data.data())?;
        Some(image_settings(
            header.image_base,
            header.image_base.wrapping_add(u64::from(header.entry_rva)),
        ))
    }
}

pub(crate) fn register_bindings(view_type: &ViewType) {
    let le = Endianness::Little;
    let x86 = bind_arch(view_type, IMAGE_FILE_MACHINE_I386, "x86", Arch::X86, le, "windows");
    let x86_64 = bind_arch(view_type, IMAGE_FILE_MACHINE_AMD64, "x86_64", Arch::X86_64, le, "windows");
    let aarch64 = bind_arch(view_type, IMAGE_FILE_MACHINE_ARM64, "aarch64", Arch::AArch64, le, "windows");
    bind_arch(view_type, IMAGE_FILE_MACHINE_ARM, "armv7", Arch::ARM, le, "windows");
    bind_arch(view_type, IMAGE_FILE_MACHINE_ARMNT, "thumb2", Arch::ARM, le, "windows");

    for arch in [&x86, &x86_64, &aarch64] {
        let efi = Platform::shared(format!("efi-{}", arch.name), Arc::clone(arch));
        for subsystem in [
            IMAGE_SUBSYSTEM_EFI_APPLICATION,
            IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER,
            IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER,
        ] {
            view_type.register_platform(subsystem, arch, Arc::clone(&efi));
        }
    }
}
