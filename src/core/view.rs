//! BinaryView: a typed view over raw data.
//!
//! Views are shared as `Arc<BinaryView>`; dropping the last handle releases
//! the view and, transitively, its parent and data source. A view built by a
//! view type wraps the raw parent view it was constructed from.

use crate::core::architecture::{Architecture, Platform};
use crate::core::binary::Endianness;
use crate::core::metadata::{Metadata, MetadataValue};
use crate::io::DataSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Numeric identifiers recovered from a format header.
///
/// `arch_id` keys architecture bindings and dynamic platform recognizers,
/// `platform_id` keys static platform bindings (e.g. ELF `e_machine` and
/// `EI_OSABI`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewIdentity {
    pub arch_id: u32,
    pub platform_id: u32,
    pub endianness: Endianness,
}

impl ViewIdentity {
    pub fn new(arch_id: u32, platform_id: u32, endianness: Endianness) -> Self {
        Self {
            arch_id,
            platform_id,
            endianness,
        }
    }
}

/// Lifecycle of a view. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViewState {
    /// Built by a view type but not yet handed to the caller
    Constructed,
    /// Architecture/platform resolved and finalization listeners notified
    Finalized,
    /// Initial analysis reported complete
    AnalysisComplete,
}

pub struct BinaryView {
    id: String,
    view_type: Option<String>,
    source: Arc<dyn DataSource>,
    parent: Option<Arc<BinaryView>>,
    identity: Option<ViewIdentity>,
    entry_point: Option<u64>,
    image_base: u64,
    metadata: RwLock<Metadata>,
    architecture: RwLock<Option<Arc<Architecture>>>,
    platform: RwLock<Option<Arc<Platform>>>,
    state: Mutex<ViewState>,
}

impl BinaryView {
    /// Wrap a data source in an untyped raw view.
    pub fn raw(source: Arc<dyn DataSource>) -> Arc<Self> {
        Arc::new(Self {
            id: new_view_id(),
            view_type: None,
            source,
            parent: None,
            identity: None,
            entry_point: None,
            image_base: 0,
            metadata: RwLock::new(Metadata::new()),
            architecture: RwLock::new(None),
            platform: RwLock::new(None),
            state: Mutex::new(ViewState::Constructed),
        })
    }

    /// Start building a typed view layered over `parent`.
    pub fn builder(view_type: impl Into<String>, parent: &Arc<BinaryView>) -> BinaryViewBuilder {
        BinaryViewBuilder {
            view_type: view_type.into(),
            parent: Arc::clone(parent),
            identity: None,
            entry_point: None,
            image_base: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the view type that built this view; `None` for raw views.
    pub fn view_type(&self) -> Option<&str> {
        self.view_type.as_deref()
    }

    pub fn parent(&self) -> Option<&Arc<BinaryView>> {
        self.parent.as_ref()
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    /// The complete underlying data.
    pub fn data(&self) -> &[u8] {
        self.source.as_slice()
    }

    pub fn len(&self) -> u64 {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Copy bytes at `offset`, returning the number actually read.
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> usize {
        self.source.read_at(offset, buf)
    }

    /// At most `len` leading bytes.
    pub fn prefix(&self, len: usize) -> &[u8] {
        let data = self.data();
        &data[..std::cmp::min(len, data.len())]
    }

    pub fn identity(&self) -> Option<ViewIdentity> {
        self.identity
    }

    pub fn entry_point(&self) -> Option<u64> {
        self.entry_point
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    /// Snapshot of the metadata bag.
    pub fn metadata(&self) -> Metadata {
        self.metadata
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        self.metadata
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.metadata
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, value);
    }

    pub fn architecture(&self) -> Option<Arc<Architecture>> {
        self.architecture
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_architecture(&self, arch: Option<Arc<Architecture>>) {
        *self.architecture.write().unwrap_or_else(|e| e.into_inner()) = arch;
    }

    pub fn platform(&self) -> Option<Arc<Platform>> {
        self.platform
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_platform(&self, platform: Option<Arc<Platform>>) {
        *self.platform.write().unwrap_or_else(|e| e.into_inner()) = platform;
    }

    pub fn state(&self) -> ViewState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the view to `next`. Returns `false` when the view is already at or
    /// beyond that state, so each transition is observed at most once.
    pub fn advance_to(&self, next: ViewState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state >= next {
            return false;
        }
        *state = next;
        true
    }
}

impl fmt::Debug for BinaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryView")
            .field("id", &self.id)
            .field("view_type", &self.view_type)
            .field("source", &self.source.description())
            .field("len", &self.len())
            .field("identity", &self.identity)
            .field("entry_point", &self.entry_point)
            .field("state", &self.state())
            .finish()
    }
}

/// Builder for typed views. The built view shares the parent's data source.
pub struct BinaryViewBuilder {
    view_type: String,
    parent: Arc<BinaryView>,
    identity: Option<ViewIdentity>,
    entry_point: Option<u64>,
    image_base: u64,
    metadata: Metadata,
}

impl BinaryViewBuilder {
    pub fn identity(mut self, identity: ViewIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn entry_point(mut self, entry: u64) -> Self {
        self.entry_point = Some(entry);
        self
    }

    pub fn image_base(mut self, base: u64) -> Self {
        self.image_base = base;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn build(self) -> Arc<BinaryView> {
        Arc::new(BinaryView {
            id: new_view_id(),
            view_type: Some(self.view_type),
            source: Arc::clone(&self.parent.source),
            parent: Some(self.parent),
            identity: self.identity,
            entry_point: self.entry_point,
            image_base: self.image_base,
            metadata: RwLock::new(self.metadata),
            architecture: RwLock::new(None),
            platform: RwLock::new(None),
            state: Mutex::new(ViewState::Constructed),
        })
    }
}

fn new_view_id() -> String {
    format!("view:uuid:{}", Uuid::new_v4())
}
