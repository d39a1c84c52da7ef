//! Process-wide catalog of view types.
//!
//! The registry is normally populated once during plugin initialization and
//! then read concurrently. Registration is serialized behind a write lock so
//! the uniqueness check and the insert are atomic; readers take `Arc`
//! snapshots and never hold the lock while plugin code runs.
//!
//! `ViewTypeRegistry::global()` is the process singleton used by the free
//! functions in this module. Independent registries can be built with
//! `ViewTypeRegistry::new()` for embedding or tests.

use super::{ViewType, ViewTypePlugin};
use crate::core::architecture::{Architecture, Platform};
use crate::core::binary::Endianness;
use crate::core::view::BinaryView;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error, info};

/// Programmer errors raised by registration. Plugin initialization that hits
/// one of these must abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("View type already registered: {0}")]
    DuplicateViewType(String),

    #[error("Invalid view type registration: {0}")]
    InvalidViewType(String),
}

#[derive(Default)]
struct RegistryInner {
    types: Vec<Arc<ViewType>>,
    by_name: HashMap<String, usize>,
}

/// Catalog of registered view types keyed by unique short name.
#[derive(Default)]
pub struct ViewTypeRegistry {
    inner: RwLock<RegistryInner>,
}

static GLOBAL_REGISTRY: Lazy<Arc<ViewTypeRegistry>> =
    Lazy::new(|| Arc::new(ViewTypeRegistry::new()));

impl ViewTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry. Plugins should be registered before
    /// recognition starts; late registrations are visible to later lookups.
    pub fn global() -> Arc<ViewTypeRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Register `plugin` under `name`.
    pub fn register<P>(
        &self,
        name: &str,
        long_name: &str,
        plugin: P,
    ) -> Result<Arc<ViewType>, RegistryError>
    where
        P: ViewTypePlugin + 'static,
    {
        self.register_shared(name, long_name, Arc::new(plugin))
    }

    /// Register an already shared plugin object under `name`.
    ///
    /// Fails without modifying the registry if the name is empty or taken.
    pub fn register_shared(
        &self,
        name: &str,
        long_name: &str,
        plugin: Arc<dyn ViewTypePlugin>,
    ) -> Result<Arc<ViewType>, RegistryError> {
        if name.trim().is_empty() {
            error!(long_name, "Rejected view type with empty short name");
            return Err(RegistryError::InvalidViewType(
                "short name must not be empty".to_string(),
            ));
        }
        if long_name.trim().is_empty() {
            error!(view_type = name, "Rejected view type with empty long name");
            return Err(RegistryError::InvalidViewType(format!(
                "long name for {} must not be empty",
                name
            )));
        }

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.by_name.contains_key(name) {
            error!(view_type = name, "Duplicate view type registration");
            return Err(RegistryError::DuplicateViewType(name.to_string()));
        }

        let index = inner.types.len();
        let view_type = Arc::new(ViewType::new(
            name.to_string(),
            long_name.to_string(),
            index,
            plugin,
        ));
        inner.types.push(Arc::clone(&view_type));
        inner.by_name.insert(name.to_string(), index);

        info!(view_type = name, long_name, index, "Registered view type");
        Ok(view_type)
    }

    /// Exact short-name lookup, including deprecated types.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<ViewType>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .by_name
            .get(name)
            .and_then(|&i| inner.types.get(i))
            .cloned()
    }

    /// Snapshot of every registered type in registration order.
    pub fn list_all(&self) -> Vec<Arc<ViewType>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .types
            .clone()
    }

    /// The subset of `list_all()` whose validity probe accepts `data`, in
    /// registration order.
    pub fn list_applicable(&self, data: &BinaryView) -> Vec<Arc<ViewType>> {
        let applicable: Vec<Arc<ViewType>> = self
            .list_all()
            .into_iter()
            .filter(|vt| vt.is_valid_for_data(data))
            .collect();
        debug!(
            source = %data.source().description(),
            count = applicable.len(),
            "Applicable view types"
        );
        applicable
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind an architecture on the named type. Unknown names are ignored and
    /// reported as `false`.
    pub fn register_architecture(
        &self,
        type_name: &str,
        id: u32,
        endian: Endianness,
        arch: Arc<Architecture>,
    ) -> bool {
        match self.get_by_name(type_name) {
            Some(vt) => {
                vt.register_architecture(id, endian, arch);
                true
            }
            None => {
                debug!(view_type = type_name, id, "Ignoring architecture binding for unknown view type");
                false
            }
        }
    }

    /// Bind a platform on the named type. Unknown names are ignored.
    pub fn register_platform(
        &self,
        type_name: &str,
        id: u32,
        arch: &Architecture,
        platform: Arc<Platform>,
    ) -> bool {
        match self.get_by_name(type_name) {
            Some(vt) => {
                vt.register_platform(id, arch, platform);
                true
            }
            None => {
                debug!(view_type = type_name, id, "Ignoring platform binding for unknown view type");
                false
            }
        }
    }

    /// Bind a default platform on the named type. Unknown names are ignored.
    pub fn register_default_platform(
        &self,
        type_name: &str,
        arch: &Architecture,
        platform: Arc<Platform>,
    ) -> bool {
        match self.get_by_name(type_name) {
            Some(vt) => {
                vt.register_default_platform(arch, platform);
                true
            }
            None => {
                debug!(view_type = type_name, "Ignoring default platform for unknown view type");
                false
            }
        }
    }
}

/// Register a plugin with the global registry.
pub fn register_view_type<P>(
    name: &str,
    long_name: &str,
    plugin: P,
) -> Result<Arc<ViewType>, RegistryError>
where
    P: ViewTypePlugin + 'static,
{
    GLOBAL_REGISTRY.register(name, long_name, plugin)
}

pub fn view_type_by_name(name: &str) -> Option<Arc<ViewType>> {
    GLOBAL_REGISTRY.get_by_name(name)
}

pub fn view_types() -> Vec<Arc<ViewType>> {
    GLOBAL_REGISTRY.list_all()
}

pub fn view_types_for_data(data: &BinaryView) -> Vec<Arc<ViewType>> {
    GLOBAL_REGISTRY.list_applicable(data)
}

pub fn register_architecture(
    type_name: &str,
    id: u32,
    endian: Endianness,
    arch: Arc<Architecture>,
) -> bool {
    GLOBAL_REGISTRY.register_architecture(type_name, id, endian, arch)
}

pub fn register_platform(
    type_name: &str,
    id: u32,
    arch: &Architecture,
    platform: Arc<Platform>,
) -> bool {
    GLOBAL_REGISTRY.register_platform(type_name, id, arch, platform)
}

pub fn register_default_platform(
    type_name: &str,
    arch: &Architecture,
    platform: Arc<Platform>,
) -> bool {
    GLOBAL_REGISTRY.register_default_platform(type_name, arch, platform)
}
