//! ELF view type.
//!
//! Identity: `arch_id` is `e_machine`, `platform_id` is `EI_OSABI` and byte
//! order comes from `EI_DATA`. Create validates the whole image with
//! `object`; parse only reads the header and program headers.

use super::{bind_arch, image_settings, read_u16, read_u32, read_u64};
use crate::core::architecture::Platform;
use crate::core::binary::{Arch, Endianness};
use crate::core::metadata::Metadata;
use crate::core::settings::Settings;
use crate::core::view::{BinaryView, ViewIdentity};
use crate::viewtype::{ViewType, ViewTypePlugin};
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "ELF";
pub const LONG_NAME: &str = "Executable and Linkable Format";

pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

pub const EM_386: u32 = 3;
pub const EM_MIPS: u32 = 8;
pub const EM_PPC: u32 = 20;
pub const EM_PPC64: u32 = 21;
pub const EM_ARM: u32 = 40;
pub const EM_X86_64: u32 = 62;
pub const EM_AARCH64: u32 = 183;
pub const EM_RISCV: u32 = 243;

pub const ELFOSABI_SYSV: u32 = 0;
pub const ELFOSABI_FREEBSD: u32 = 9;

const PT_LOAD: u32 = 1;
const PT_INTERP: u32 = 3;
// Upper bound on program headers scanned for the interpreter.
const MAX_PROGRAM_HEADERS: usize = 256;
const MAX_INTERP_LEN: usize = 4096;

/// Fields recovered from the ELF identification and file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfHeaderInfo {
    pub is_64: bool,
    pub endianness: Endianness,
    pub osabi: u8,
    pub e_type: u16,
    pub machine: u16,
    pub entry: u64,
    pub phoff: u64,
    pub phentsize: u16,
    pub phnum: u16,
}

/// Bounded header read. `None` on bad magic, unknown class/encoding or
/// truncation.
pub fn parse_header(data: &[u8]) -> Option<ElfHeaderInfo> {
    if data.get(..4)? != ELF_MAGIC {
        return None;
    }
    let is_64 = match data.get(4)? {
        1 => false,
        2 => true,
        _ => return None,
    };
    let endianness = match data.get(5)? {
        1 => Endianness::Little,
        2 => Endianness::Big,
        _ => return None,
    };
    let osabi = *data.get(7)?;
    let e_type = read_u16(data, 16, endianness)?;
    let machine = read_u16(data, 18, endianness)?;

    let (entry, phoff, phentsize, phnum) = if is_64 {
        (
            read_u64(data, 24, endianness)?,
            read_u64(data, 32, endianness)?,
            read_u16(data, 54, endianness)?,
            read_u16(data, 56, endianness)?,
        )
    } else {
        (
            u64::from(read_u32(data, 24, endianness)?),
            u64::from(read_u32(data, 28, endianness)?),
            read_u16(data, 42, endianness)?,
            read_u16(data, 44, endianness)?,
        )
    };

    Some(ElfHeaderInfo {
        is_64,
        endianness,
        osabi,
        e_type,
        machine,
        entry,
        phoff,
        phentsize,
        phnum,
    })
}

/// Program interpreter path from `PT_INTERP`, if present and in bounds.
pub fn interpreter(data: &[u8], header: &ElfHeaderInfo) -> Option<String> {
    let endian = header.endianness;
    let phoff = usize::try_from(header.phoff).ok()?;
    let entsize = usize::from(header.phentsize);
    for index in 0..usize::from(header.phnum).min(MAX_PROGRAM_HEADERS) {
        let ph = phoff.checked_add(index.checked_mul(entsize)?)?;
        if read_u32(data, ph, endian)? != PT_INTERP {
            continue;
        }
        let (offset, size) = if header.is_64 {
            (read_u64(data, ph + 8, endian)?, read_u64(data, ph + 32, endian)?)
        } else {
            (
                u64::from(read_u32(data, ph + 4, endian)?),
                u64::from(read_u32(data, ph + 16, endian)?),
            )
        };
        let start = usize::try_from(offset).ok()?;
        let len = usize::try_from(size).ok()?.min(MAX_INTERP_LEN);
        let raw = data.get(start..start.checked_add(len)?)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        return std::str::from_utf8(&raw[..end]).ok().map(str::to_string);
    }
    None
}

/// Lowest `PT_LOAD` virtual address, or 0 when no load segment is readable.
/// Scanning stops at the first program header that is out of bounds.
pub fn load_base(data: &[u8], header: &ElfHeaderInfo) -> u64 {
    let endian = header.endianness;
    let Ok(phoff) = usize::try_from(header.phoff) else {
        return 0;
    };
    let entsize = usize::from(header.phentsize);
    let mut base: Option<u64> = None;
    for index in 0..usize::from(header.phnum).min(MAX_PROGRAM_HEADERS) {
        let Some(ph) = index
            .checked_mul(entsize)
            .and_then(|rel| phoff.checked_add(rel))
        else {
            break;
        };
        let Some(p_type) = read_u32(data, ph, endian) else {
            break;
        };
        if p_type != PT_LOAD {
            continue;
        }
        let vaddr = if header.is_64 {
            read_u64(data, ph + 16, endian)
        } else {
            read_u32(data, ph + 8, endian).map(u64::from)
        };
        let Some(vaddr) = vaddr else {
            break;
        };
        base = Some(base.map_or(vaddr, |b| b.min(vaddr)));
    }
    base.unwrap_or(0)
}

pub struct ElfViewType;

impl ElfViewType {
    fn build(&self, data: &Arc<BinaryView>, validate_image: bool) -> Option<Arc<BinaryView>> {
        let bytes = data.data();
        let header = parse_header(bytes)?;
        if validate_image {
            if let Err(e) = object::File::parse(bytes) {
                debug!(error = %e, "ELF header accepted but image rejected");
                return None;
            }
        }
        let image_base = load_base(bytes, &header);

        let mut builder = BinaryView::builder(NAME, data)
            .identity(ViewIdentity::new(
                u32::from(header.machine),
                u32::from(header.osabi),
                header.endianness,
            ))
            .entry_point(header.entry)
            .image_base(image_base)
            .metadata("elf.class", if header.is_64 { 64u64 } else { 32u64 })
            .metadata("elf.type", u64::from(header.e_type))
            .metadata("elf.machine", u64::from(header.machine))
            .metadata("elf.osabi", u64::from(header.osabi));
        if let Some(interp) = interpreter(bytes, &header) {
            builder = builder.metadata("elf.interpreter", interp);
        }
        Some(builder.build())
    }
}

impl ViewTypePlugin for ElfViewType {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data, true)
    }

    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data, false)
    }

    fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        data.prefix(ELF_MAGIC.len()) == ELF_MAGIC
    }

    fn load_settings_for_data(&self, data: &BinaryView) -> Option<Settings> {
        let bytes = data.data();
        let header = parse_header(bytes)?;
        Some(image_settings(load_base(bytes, &header), header.entry))
    }
}

fn android_recognizer(
    platform: Arc<Platform>,
) -> impl Fn(&Arc<BinaryView>, &Metadata) -> Option<Arc<Platform>> + Send + Sync + 'static {
    move |_view, metadata| {
        let interp = metadata.get("elf.interpreter")?.as_str()?;
        interp
            .starts_with("/system/bin/linker")
            .then(|| Arc::clone(&platform))
    }
}

pub(crate) fn register_bindings(view_type: &ViewType) {
    let le = Endianness::Little;
    let be = Endianness::Big;

    let x86 = bind_arch(view_type, EM_386, "x86", Arch::X86, le, "linux");
    let x86_64 = bind_arch(view_type, EM_X86_64, "x86_64", Arch::X86_64, le, "linux");
    let armv7 = bind_arch(view_type, EM_ARM, "armv7", Arch::ARM, le, "linux");
    let aarch64 = bind_arch(view_type, EM_AARCH64, "aarch64", Arch::AArch64, le, "linux");
    bind_arch(view_type, EM_MIPS, "mips32", Arch::MIPS, be, "linux");
    bind_arch(view_type, EM_MIPS, "mipsel32", Arch::MIPS, le, "linux");
    bind_arch(view_type, EM_PPC, "ppc", Arch::PPC, be, "linux");
    bind_arch(view_type, EM_PPC64, "ppc64", Arch::PPC64, be, "linux");
    bind_arch(view_type, EM_RISCV, "riscv64", Arch::RISCV64, le, "linux");

    for arch in [&x86, &x86_64, &aarch64] {
        let freebsd = Platform::shared(format!("freebsd-{}", arch.name), Arc::clone(arch));
        view_type.register_platform(ELFOSABI_FREEBSD, arch, freebsd);
    }

    for (id, arch) in [(EM_ARM, &armv7), (EM_AARCH64, &aarch64), (EM_X86_64, &x86_64)] {
        let android = Platform::shared(format!("android-{}", arch.name), Arc::clone(arch));
        view_type.register_platform_recognizer(u64::from(id), le, android_recognizer(android));
    }
}
