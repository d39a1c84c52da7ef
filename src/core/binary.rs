//! Primitive identity types shared by architectures, platforms and views.
//!
//! `Arch` names a CPU family independently of any format-specific numbering;
//! `Endianness` is the byte order half of every `(id, endianness)` binding key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The CPU architecture family of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86
    X86,
    /// 64-bit x86
    X86_64,
    /// 32-bit ARM
    ARM,
    /// 64-bit ARM
    AArch64,
    /// MIPS (32-bit)
    MIPS,
    /// MIPS (64-bit)
    MIPS64,
    /// PowerPC (32-bit)
    PPC,
    /// PowerPC (64-bit)
    PPC64,
    /// RISC-V (32-bit)
    RISCV,
    /// RISC-V (64-bit)
    RISCV64,
    /// Unknown or unsupported architecture
    Unknown,
}

impl Arch {
    pub fn is_64_bit(&self) -> bool {
        matches!(
            self,
            Arch::X86_64 | Arch::AArch64 | Arch::MIPS64 | Arch::PPC64 | Arch::RISCV64
        )
    }

    pub fn bits(&self) -> u8 {
        if self.is_64_bit() {
            64
        } else {
            32
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
            Arch::X86_64 => write!(f, "x86_64"),
            Arch::ARM => write!(f, "arm"),
            Arch::AArch64 => write!(f, "aarch64"),
            Arch::MIPS => write!(f, "mips"),
            Arch::MIPS64 => write!(f, "mips64"),
            Arch::PPC => write!(f, "ppc"),
            Arch::PPC64 => write!(f, "ppc64"),
            Arch::RISCV => write!(f, "riscv"),
            Arch::RISCV64 => write!(f, "riscv64"),
            Arch::Unknown => write!(f, "unknown"),
        }
    }
}

/// The endianness of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

impl Endianness {
    /// Decode a `u16` stored in this byte order.
    pub fn read_u16(&self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Decode a `u32` stored in this byte order.
    pub fn read_u32(&self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Decode a `u64` stored in this byte order.
    pub fn read_u64(&self, bytes: [u8; 8]) -> u64 {
        match self {
            Endianness::Little => u64::from_le_bytes(bytes),
            Endianness::Big => u64::from_be_bytes(bytes),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}
