//! Built-in view types for common executable formats.
//!
//! Each format recognizes its magic with a bounded header probe, records the
//! numeric identity fields the header carries and binds those ids to
//! architectures and platforms on its own view type. Registration order is
//! ELF, PE, Mach-O, Raw; Raw accepts anything at fallback priority.

pub mod elf;
pub mod macho;
pub mod pe;
pub mod raw;

use crate::core::architecture::{Architecture, Platform};
use crate::core::binary::{Arch, Endianness};
use crate::core::settings::{SettingSchema, SettingValue, Settings};
use crate::viewtype::{RegistryError, ViewType, ViewTypeRegistry};
use std::sync::Arc;
use tracing::info;

pub use elf::ElfViewType;
pub use macho::MachOViewType;
pub use pe::PeViewType;
pub use raw::RawViewType;

/// Load setting: address the image is rebased to.
pub const SETTING_IMAGE_BASE: &str = "loader.imageBase";
/// Load setting: entry point override.
pub const SETTING_ENTRY_POINT: &str = "loader.entryPoint";
/// Load setting: architecture name for headerless data.
pub const SETTING_ARCHITECTURE: &str = "loader.architecture";
/// Load setting: platform name for headerless data.
pub const SETTING_PLATFORM: &str = "loader.platform";

/// Register ELF, PE, Mach-O and Raw on `registry` together with their
/// architecture and platform bindings.
pub fn register_builtin_view_types(registry: &ViewTypeRegistry) -> Result<(), RegistryError> {
    let elf = registry.register(elf::NAME, elf::LONG_NAME, ElfViewType)?;
    elf::register_bindings(&elf);

    let pe = registry.register(pe::NAME, pe::LONG_NAME, PeViewType)?;
    pe::register_bindings(&pe);

    let macho = registry.register(macho::NAME, macho::LONG_NAME, MachOViewType)?;
    macho::register_bindings(&macho);

    registry.register(raw::NAME, raw::LONG_NAME, RawViewType)?;

    info!(count = registry.len(), "Registered built-in view types");
    Ok(())
}

/// Bind `id` to a fresh architecture and give it a default platform named
/// `"{os}-{arch}"`.
pub(crate) fn bind_arch(
    view_type: &ViewType,
    id: u32,
    name: &str,
    arch: Arch,
    endian: Endianness,
    os: &str,
) -> Arc<Architecture> {
    let architecture = Architecture::shared(name, arch, endian);
    view_type.register_architecture(id, endian, Arc::clone(&architecture));
    let platform = Platform::shared(format!("{}-{}", os, name), Arc::clone(&architecture));
    view_type.register_default_platform(&architecture, platform);
    architecture
}

/// Settings shared by the header-driven formats.
pub(crate) fn image_settings(image_base: u64, entry_point: u64) -> Settings {
    Settings::new()
        .with_setting(
            SETTING_IMAGE_BASE,
            SettingSchema::new(
                "Image Base Address",
                "Address the image is loaded at",
                SettingValue::Number(image_base),
            ),
        )
        .with_setting(
            SETTING_ENTRY_POINT,
            SettingSchema::new(
                "Entry Point Offset",
                "Address execution starts at",
                SettingValue::Number(entry_point),
            ),
        )
}

fn field<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    data.get(offset..offset.checked_add(N)?)?.try_into().ok()
}

pub(crate) fn read_u16(data: &[u8], offset: usize, endian: Endianness) -> Option<u16> {
    field::<2>(data, offset).map(|b| endian.read_u16(b))
}

pub(crate) fn read_u32(data: &[u8], offset: usize, endian: Endianness) -> Option<u32> {
    field::<4>(data, offset).map(|b| endian.read_u32(b))
}

pub(crate) fn read_u64(data: &[u8], offset: usize, endian: Endianness) -> Option<u64> {
    field::<8>(data, offset).map(|b| endian.read_u64(b))
}
