//! Raw view type: accepts any data, including empty input, at fallback
//! priority so that recognition always has a last resort.

use super::{SETTING_ARCHITECTURE, SETTING_IMAGE_BASE, SETTING_PLATFORM};
use crate::core::settings::{SettingSchema, SettingValue, Settings};
use crate::core::view::BinaryView;
use crate::viewtype::{Priority, ViewTypePlugin};
use std::sync::Arc;

pub const NAME: &str = "Raw";
pub const LONG_NAME: &str = "Raw";

pub struct RawViewType;

impl ViewTypePlugin for RawViewType {
    fn create(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        Some(BinaryView::builder(NAME, data).build())
    }

    fn parse(&self, data: &Arc<BinaryView>) -> Option<Arc<BinaryView>> {
        Some(BinaryView::builder(NAME, data).build())
    }

    fn is_valid_for_data(&self, _data: &BinaryView) -> bool {
        true
    }

    // Headerless data has no identity; the user supplies it.
    fn load_settings_for_data(&self, _data: &BinaryView) -> Option<Settings> {
        Some(
            Settings::new()
                .with_setting(
                    SETTING_ARCHITECTURE,
                    SettingSchema::new(
                        "Architecture",
                        "Architecture name to disassemble the data as",
                        SettingValue::String(String::new()),
                    ),
                )
                .with_setting(
                    SETTING_PLATFORM,
                    SettingSchema::new(
                        "Platform",
                        "Platform name for the data",
                        SettingValue::String(String::new()),
                    ),
                )
                .with_setting(
                    SETTING_IMAGE_BASE,
                    SettingSchema::new(
                        "Image Base Address",
                        "Address the data is loaded at",
                        SettingValue::Number(0),
                    ),
                ),
        )
    }

    fn priority(&self) -> Priority {
        Priority::FALLBACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteSource;

    #[test]
    fn test_accepts_empty_data() {
        let data = BinaryView::raw(Arc::new(ByteSource::new(Vec::<u8>::new())));
        assert!(RawViewType.is_valid_for_data(&data));
        let view = RawViewType.create(&data).unwrap();
        assert_eq!(view.view_type(), Some(NAME));
        assert!(view.identity().is_none());
        assert!(view.is_empty());
    }

    #[test]
    fn test_view_shares_parent_bytes() {
        let data = BinaryView::raw(Arc::new(ByteSource::new(&b"\x00\x01\x02"[..])));
        let view = RawViewType.parse(&data).unwrap();
        assert_eq!(view.data(), b"\x00\x01\x02");
        assert!(Arc::ptr_eq(view.parent().unwrap(), &data));
    }

    #[test]
    fn test_settings_round_trip() {
        let data = BinaryView::raw(Arc::new(ByteSource::new(&b"x"[..])));
        let mut settings = RawViewType.load_settings_for_data(&data).unwrap();
        settings
            .apply_json(r#"{"loader.architecture": "armv7", "loader.imageBase": 4096}"#)
            .unwrap();
        assert_eq!(settings.get_string(SETTING_ARCHITECTURE), Some("armv7"));
        assert_eq!(settings.get_u64(SETTING_IMAGE_BASE), Some(4096));
        assert_eq!(settings.get_string(SETTING_PLATFORM), Some(""));
    }
}
