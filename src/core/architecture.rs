//! Architecture and platform descriptors.
//!
//! These are the handles stored in per-view-type binding tables. Both are
//! shared as `Arc`s; equality is by name, which is unique per process.

use crate::core::binary::{Arch, Endianness};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A CPU architecture descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    /// Unique name (e.g. "x86_64", "armv7eb")
    pub name: String,
    /// Architecture family
    pub arch: Arch,
    /// Default byte order for instructions and data
    pub endianness: Endianness,
    /// Pointer size in bytes
    pub address_size: usize,
}

impl Architecture {
    /// Create a descriptor whose address size follows the family's bitness.
    pub fn new(name: impl Into<String>, arch: Arch, endianness: Endianness) -> Self {
        Self {
            name: name.into(),
            arch,
            endianness,
            address_size: (arch.bits() / 8) as usize,
        }
    }

    /// Convenience constructor returning a shared handle.
    pub fn shared(name: impl Into<String>, arch: Arch, endianness: Endianness) -> Arc<Self> {
        Arc::new(Self::new(name, arch, endianness))
    }
}

impl PartialEq for Architecture {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Architecture {}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An operating-system/ABI platform bound to one architecture.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Unique name (e.g. "linux-x86_64", "windows-x86")
    pub name: String,
    /// Architecture this platform runs on
    pub architecture: Arc<Architecture>,
}

impl Platform {
    pub fn new(name: impl Into<String>, architecture: Arc<Architecture>) -> Self {
        Self {
            name: name.into(),
            architecture,
        }
    }

    pub fn shared(name: impl Into<String>, architecture: Arc<Architecture>) -> Arc<Self> {
        Arc::new(Self::new(name, architecture))
    }
}

impl PartialEq for Platform {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Platform {}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
