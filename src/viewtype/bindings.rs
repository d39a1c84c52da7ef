//! Per-view-type architecture and platform side tables.
//!
//! Format plugins recover numeric identifiers from headers (ELF `e_machine`,
//! PE `Machine`, Mach-O `cputype`); architecture and platform plugins bind
//! those identifiers to descriptors here during their own initialization.
//! Tables are append-only or replace-by-key, and dynamic recognizers are
//! invoked from a snapshot so no lock is held while user code runs.

use crate::core::architecture::{Architecture, Platform};
use crate::core::binary::Endianness;
use crate::core::metadata::Metadata;
use crate::core::view::BinaryView;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace, warn};

/// Dynamic platform recognizer: returns a platform or declines with `None`.
pub type PlatformRecognizerFn =
    dyn Fn(&Arc<BinaryView>, &Metadata) -> Option<Arc<Platform>> + Send + Sync;

#[derive(Default)]
struct BindingTables {
    architectures: HashMap<(u32, Endianness), Arc<Architecture>>,
    platforms: HashMap<(u32, String), Arc<Platform>>,
    default_platforms: HashMap<String, Arc<Platform>>,
    recognizers: HashMap<(u64, Endianness), Vec<Arc<PlatformRecognizerFn>>>,
}

/// Architecture/platform bindings owned by one view type.
#[derive(Default)]
pub struct ArchitecturePlatformBindings {
    tables: RwLock<BindingTables>,
}

impl ArchitecturePlatformBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `(id, endian)` to `arch`, replacing any previous binding.
    pub fn register_architecture(&self, id: u32, endian: Endianness, arch: Arc<Architecture>) {
        trace!(id, %endian, arch = %arch, "Binding architecture");
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .architectures
            .insert((id, endian), arch);
    }

    /// Exact-match lookup.
    pub fn architecture(&self, id: u32, endian: Endianness) -> Option<Arc<Architecture>> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .architectures
            .get(&(id, endian))
            .cloned()
    }

    /// Bind `(id, arch)` to `platform`, replacing any previous binding.
    pub fn register_platform(&self, id: u32, arch: &Architecture, platform: Arc<Platform>) {
        trace!(id, arch = %arch, platform = %platform, "Binding platform");
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .platforms
            .insert((id, arch.name.clone()), platform);
    }

    pub fn register_default_platform(&self, arch: &Architecture, platform: Arc<Platform>) {
        trace!(arch = %arch, platform = %platform, "Binding default platform");
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .default_platforms
            .insert(arch.name.clone(), platform);
    }

    /// Exact-match lookup; the default platform is not consulted.
    pub fn platform(&self, id: u32, arch: &Architecture) -> Option<Arc<Platform>> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .platforms
            .get(&(id, arch.name.clone()))
            .cloned()
    }

    pub fn default_platform(&self, arch: &Architecture) -> Option<Arc<Platform>> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .default_platforms
            .get(&arch.name)
            .cloned()
    }

    /// Append a recognizer to the chain for `(id, endian)`.
    pub fn register_platform_recognizer<F>(&self, id: u64, endian: Endianness, callback: F)
    where
        F: Fn(&Arc<BinaryView>, &Metadata) -> Option<Arc<Platform>> + Send + Sync + 'static,
    {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let chain = tables.recognizers.entry((id, endian)).or_default();
        chain.push(Arc::new(callback));
        debug!(id, %endian, chain_len = chain.len(), "Registered platform recognizer");
    }

    pub fn recognizer_count(&self, id: u64, endian: Endianness) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .recognizers
            .get(&(id, endian))
            .map_or(0, Vec::len)
    }

    /// Run the recognizer chain for `(id, endian)` in registration order.
    /// The first platform returned wins; a panicking recognizer counts as
    /// declining.
    pub fn recognize_platform(
        &self,
        id: u64,
        endian: Endianness,
        view: &Arc<BinaryView>,
        metadata: &Metadata,
    ) -> Option<Arc<Platform>> {
        let chain: Vec<Arc<PlatformRecognizerFn>> = self
            .tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .recognizers
            .get(&(id, endian))
            .cloned()
            .unwrap_or_default();

        for (position, recognizer) in chain.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| recognizer(view, metadata))) {
                Ok(Some(platform)) => {
                    debug!(id, %endian, position, platform = %platform, "Platform recognized");
                    return Some(platform);
                }
                Ok(None) => {}
                Err(_) => {
                    warn!(id, %endian, position, "Platform recognizer panicked; treating as declined");
                }
            }
        }
        None
    }
}
