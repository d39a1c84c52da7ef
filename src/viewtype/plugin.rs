//! The capability contract implemented by format plugins.

use crate::core::settings::Settings;
use crate::core::view::BinaryView;
use std::fmt;
use std::sync::Arc;

/// Ranking used when several view types accept the same data.
///
/// Higher values win; ties fall back to registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Catch-all types that accept anything (raw/flat images).
    pub const FALLBACK: Priority = Priority(i32::MIN);
    /// Generic containers that more specific types should override.
    pub const LOW: Priority = Priority(-100);
    pub const DEFAULT: Priority = Priority(0);
    /// Specialised variants of a format that must beat the generic loader.
    pub const HIGH: Priority = Priority(100);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Priority::FALLBACK => write!(f, "fallback"),
            Priority(p) => write!(f, "{}", p),
        }
    }
}

/// Format-specific recognition and construction logic.
///
/// Every method has an inert default, so an implementation that overrides
/// nothing never matches and builds nothing. Implementations must not panic
/// on malformed input; returning `false`/`None` is the declination signal.
/// The registry still isolates panics, but a panicking plugin is a bug.
pub trait ViewTypePlugin: Send + Sync {
    /// Build a fully analyzable view over `data`.
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        let _ = data;
        None
    }

    /// Build a view for structural inspection only, without committing to analysis.
    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        let _ = data;
        None
    }

    /// Cheap, side-effect-free probe.
    fn is_valid_for_data(&self, data: &BinaryView) -> bool {
        let _ = data;
        false
    }

    fn is_deprecated(&self) -> bool {
        false
    }

    /// Loader options this type understands for `data`, if any.
    fn load_settings_for_data(&self, data: &BinaryView) -> Option<Settings> {
        let _ = data;
        None
    }

    fn priority(&self) -> Priority {
        Priority::DEFAULT
    }
}
