//! Synthetic headers and configurable test plugins.

use binview::core::view::{BinaryView, ViewIdentity};
use binview::core::Endianness;
use binview::viewtype::{Priority, ViewTypePlugin};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Minimal ELF64 little-endian executable header.
pub fn elf64(machine: u16, osabi: u8) -> Vec<u8> {
    let mut h = vec![0u8; 64];
    h[..4].copy_from_slice(b"\x7fELF");
    h[4] = 2;
    h[5] = 1;
    h[6] = 1;
    h[7] = osabi;
    h[16..18].copy_from_slice(&2u16.to_le_bytes());
    h[18..20].copy_from_slice(&machine.to_le_bytes());
    h[20..24].copy_from_slice(&1u32.to_le_bytes());
    h[24..32].copy_from_slice(&0x401000u64.to_le_bytes());
    h[52..54].copy_from_slice(&64u16.to_le_bytes());
    h[54..56].copy_from_slice(&56u16.to_le_bytes());
    h[58..60].copy_from_slice(&64u16.to_le_bytes());
    h
}

/// DOS header, `PE\0\0`, COFF header and a PE32 optional header.
pub fn pe32(machine: u16, subsystem: u16) -> Vec<u8> {
    let mut d = vec![0u8; 0x80 + 4 + 20 + 224];
    d[..2].copy_from_slice(b"MZ");
    d[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());
    d[0x80..0x84].copy_from_slice(b"PE\0\0");
    let coff = 0x84;
    d[coff..coff + 2].copy_from_slice(&machine.to_le_bytes());
    d[coff + 16..coff + 18].copy_from_slice(&224u16.to_le_bytes());
    let opt = coff + 20;
    d[opt..opt + 2].copy_from_slice(&0x10bu16.to_le_bytes());
    d[opt + 16..opt + 20].copy_from_slice(&0x1000u32.to_le_bytes());
    d[opt + 28..opt + 32].copy_from_slice(&0x400000u32.to_le_bytes());
    d[opt + 68..opt + 70].copy_from_slice(&subsystem.to_le_bytes());
    d
}

/// 32-bit big-endian Mach-O header with no load commands.
pub fn macho32_be(cputype: u32) -> Vec<u8> {
    let mut d = Vec::new();
    for v in [0xfeed_faceu32, cputype, 0, 2, 0, 0, 0] {
        d.extend_from_slice(&v.to_be_bytes());
    }
    d
}

/// A plugin driven entirely by its fields, counting construction calls.
pub struct TestPlugin {
    pub name: &'static str,
    pub magic: &'static [u8],
    pub priority: Priority,
    pub deprecated: bool,
    pub builds: bool,
    pub constructed: Arc<AtomicUsize>,
}

impl TestPlugin {
    pub fn new(name: &'static str, magic: &'static [u8]) -> Self {
        Self {
            name,
            magic,
            priority: Priority::DEFAULT,
            deprecated: false,
            builds: true,
            constructed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn declining(mut self) -> Self {
        self.builds = false;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.constructed)
    }

    fn build(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        self.builds.then(|| {
            BinaryView::builder(self.name, data)
                .identity(ViewIdentity::new(1, 0, Endianness::Little))
                .build()
        })
    }
}

impl ViewTypePlugin for TestPlugin {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.build(data)
    }

    fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        data.data().starts_with(self.magic)
    }

    fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}
