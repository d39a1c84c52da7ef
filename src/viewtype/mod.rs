//! View types: registered format plugins and their bindings.
//!
//! A `ViewType` is the registry-owned record for one plugin: its identity
//! (short and long name), the plugin itself and its architecture/platform
//! side tables. All calls into plugin code go through the wrappers here, which
//! absorb panics into the plugin contract's declination values.

pub mod bindings;
pub mod plugin;
pub mod registry;

pub use bindings::{ArchitecturePlatformBindings, PlatformRecognizerFn};
pub use plugin::{Priority, ViewTypePlugin};
pub use registry::{
    register_architecture, register_default_platform, register_platform, register_view_type,
    view_type_by_name, view_types, view_types_for_data, RegistryError, ViewTypeRegistry,
};

use crate::core::architecture::{Architecture, Platform};
use crate::core::binary::Endianness;
use crate::core::metadata::Metadata;
use crate::core::settings::Settings;
use crate::core::view::BinaryView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// How a view type should build its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstructionMode {
    /// Full construction, eligible for analysis
    #[default]
    Create,
    /// Lightweight structural parse
    Parse,
}

impl fmt::Display for ConstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionMode::Create => write!(f, "create"),
            ConstructionMode::Parse => write!(f, "parse"),
        }
    }
}

/// A registered view type.
pub struct ViewType {
    name: String,
    long_name: String,
    index: usize,
    plugin: Arc<dyn ViewTypePlugin>,
    bindings: ArchitecturePlatformBindings,
}

impl ViewType {
    pub(crate) fn new(
        name: String,
        long_name: String,
        index: usize,
        plugin: Arc<dyn ViewTypePlugin>,
    ) -> Self {
        Self {
            name,
            long_name,
            index,
            plugin,
            bindings: ArchitecturePlatformBindings::new(),
        }
    }

    /// Unique short name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name.
    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Position in registration order.
    pub fn registration_index(&self) -> usize {
        self.index
    }

    pub fn bindings(&self) -> &ArchitecturePlatformBindings {
        &self.bindings
    }

    pub fn priority(&self) -> Priority {
        self.guarded("priority", Priority::DEFAULT, || self.plugin.priority())
    }

    pub fn is_deprecated(&self) -> bool {
        self.guarded("is_deprecated", false, || self.plugin.is_deprecated())
    }

    pub fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        self.guarded("is_valid_for_data", false, || {
            self.plugin.is_valid_for_data(data)
        })
    }

    pub fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.guarded("create", None, || self.plugin.create(data))
    }

    pub fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        self.guarded("parse", None, || self.plugin.parse(data))
    }

    /// Dispatch to `create` or `parse`.
    pub fn construct(&self, mode: ConstructionMode, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        match mode {
            ConstructionMode::Create => self.create(data),
            ConstructionMode::Parse => self.parse(data),
        }
    }

    pub fn load_settings_for_data(&self, data: &BinaryView) -> Option<Settings> {
        self.guarded("load_settings_for_data", None, || {
            self.plugin.load_settings_for_data(data)
        })
    }

    pub fn register_architecture(&self, id: u32, endian: Endianness, arch: Arc<Architecture>) {
        self.bindings.register_architecture(id, endian, arch);
    }

    pub fn get_architecture(&self, id: u32, endian: Endianness) -> Option<Arc<Architecture>> {
        self.bindings.architecture(id, endian)
    }

    pub fn register_platform(&self, id: u32, arch: &Architecture, platform: Arc<Platform>) {
        self.bindings.register_platform(id, arch, platform);
    }

    pub fn register_default_platform(&self, arch: &Architecture, platform: Arc<Platform>) {
        self.bindings.register_default_platform(arch, platform);
    }

    pub fn get_platform(&self, id: u32, arch: &Architecture) -> Option<Arc<Platform>> {
        self.bindings.platform(id, arch)
    }

    pub fn get_default_platform(&self, arch: &Architecture) -> Option<Arc<Platform>> {
        self.bindings.default_platform(arch)
    }

    pub fn register_platform_recognizer<F>(&self, id: u64, endian: Endianness, callback: F)
    where
        F: Fn(&Arc<BinaryView>, &Metadata) -> Option<Arc<Platform>> + Send + Sync + 'static,
    {
        self.bindings
            .register_platform_recognizer(id, endian, callback);
    }

    pub fn recognize_platform(
        &self,
        id: u64,
        endian: Endianness,
        view: &Arc<BinaryView>,
        metadata: &Metadata,
    ) -> Option<Arc<Platform>> {
        self.bindings.recognize_platform(id, endian, view, metadata)
    }

    /// Attach an architecture and platform to `view` from its recovered identity.
    ///
    /// Architecture comes from `(arch_id, endianness)`. Platform resolution
    /// tries the static `(platform_id, architecture)` entry, then the dynamic
    /// recognizers for `(arch_id, endianness)`, then the architecture's
    /// default platform. Anything already set on the view is left alone.
    /// Returns `true` when the view ends up with a platform.
    pub fn resolve_platform(&self, view: &Arc<BinaryView>) -> bool {
        if view.platform().is_some() {
            return true;
        }
        let Some(identity) = view.identity() else {
            return false;
        };

        let arch = match view.architecture() {
            Some(arch) => Some(arch),
            None => {
                let arch = self.get_architecture(identity.arch_id, identity.endianness);
                view.set_architecture(arch.clone());
                arch
            }
        };

        let platform = arch
            .as_ref()
            .and_then(|arch| self.get_platform(identity.platform_id, arch))
            .or_else(|| {
                let metadata = view.metadata();
                self.recognize_platform(
                    u64::from(identity.arch_id),
                    identity.endianness,
                    view,
                    &metadata,
                )
            })
            .or_else(|| {
                arch.as_ref()
                    .and_then(|arch| self.get_default_platform(arch))
            });

        match platform {
            Some(platform) => {
                if view.architecture().is_none() {
                    view.set_architecture(Some(Arc::clone(&platform.architecture)));
                }
                debug!(
                    view_type = %self.name,
                    arch_id = identity.arch_id,
                    platform_id = identity.platform_id,
                    platform = %platform,
                    "Resolved platform"
                );
                view.set_platform(Some(platform));
                true
            }
            None => {
                debug!(
                    view_type = %self.name,
                    arch_id = identity.arch_id,
                    platform_id = identity.platform_id,
                    "No platform binding matched"
                );
                false
            }
        }
    }

    fn guarded<T>(&self, op: &'static str, declined: T, f: impl FnOnce() -> T) -> T {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => value,
            Err(_) => {
                warn!(view_type = %self.name, op, "View type plugin panicked; treating as declined");
                declined
            }
        }
    }
}

impl fmt::Debug for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewType")
            .field("name", &self.name)
            .field("long_name", &self.long_name)
            .field("index", &self.index)
            .finish()
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
