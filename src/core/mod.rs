//! Core data types for binview.
//!
//! Value types shared by the registry, the recognition engine and view-type
//! plugins: architecture/platform descriptors, views, metadata bags, load
//! settings and IL source locations.

pub mod architecture;
pub mod binary;
pub mod il_source;
pub mod metadata;
pub mod settings;
pub mod view;

pub use architecture::{Architecture, Platform};
pub use binary::{Arch, Endianness};
pub use il_source::{IlInstruction, IlLevel, IlSourceLocation};
pub use metadata::{Metadata, MetadataValue};
pub use settings::{SettingKind, SettingSchema, SettingValue, Settings, SettingsError};
pub use view::{BinaryView, BinaryViewBuilder, ViewIdentity, ViewState};
