//! App settings persistence.

use std::fs;
use std::path::Path;

use super::types::AppSettings;
use super::{write_json_atomic, StoreError};

/// File name of the settings inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Save settings to `<dir>/settings.json`.
pub fn save_settings(dir: &Path, settings: &AppSettings) -> Result<(), StoreError> {
    write_json_atomic(&dir.join(SETTINGS_FILE), settings)
}

/// Load settings from `<dir>/settings.json`.
///
/// Missing or invalid fields take their defaults one by one; a missing or
/// unparsable file yields the default settings.
pub fn load_settings(dir: &Path) -> AppSettings {
    let path = dir.join(SETTINGS_FILE);

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(_) => return AppSettings::default(),
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        log::warn!("Ignoring unparsable {}: {}", path.display(), e);
        AppSettings::default()
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::types::{QuickCapturePosition, QuickCaptureSettings};
    use tempfile::tempdir;

    #[test]
    fn save_and_load_settings() {
        let dir = tempdir().unwrap();
        let settings = AppSettings {
            quick_capture: QuickCaptureSettings {
                enabled: false,
                position: QuickCapturePosition::TopLeft,
            },
        };

        save_settings(dir.path(), &settings).unwrap();
        let loaded = load_settings(dir.path());

        assert_eq!(loaded, settings);
    }

    #[test]
    fn load_nonexistent_returns_default() {
        let dir = tempdir().unwrap();
        assert_eq!(load_settings(dir.path()), AppSettings::default());
    }

    #[test]
    fn load_corrupt_returns_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();

        assert_eq!(load_settings(dir.path()), AppSettings::default());
    }

    #[test]
    fn load_partial_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"quickCapture": {"position": "center"}}"#,
        )
        .unwrap();

        let loaded = load_settings(dir.path());
        assert!(loaded.quick_capture.enabled);
        assert_eq!(loaded.quick_capture.position, QuickCapturePosition::Center);
    }

    #[test]
    fn unknown_position_keeps_other_fields() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"quickCapture": {"enabled": false, "position": "middle"}}"#,
        )
        .unwrap();

        let loaded = load_settings(dir.path());
        assert!(!loaded.quick_capture.enabled);
        assert_eq!(loaded.quick_capture.position, QuickCapturePosition::BottomRight);
    }

    #[test]
    fn null_fields_take_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"quickCapture": {"enabled": null, "position": "top-right"}}"#,
        )
        .unwrap();

        let loaded = load_settings(dir.path());
        assert!(loaded.quick_capture.enabled);
        assert_eq!(loaded.quick_capture.position, QuickCapturePosition::TopRight);
    }

    #[test]
    fn settings_file_uses_camel_case() {
        let dir = tempdir().unwrap();
        save_settings(dir.path(), &AppSettings::default()).unwrap();

        let contents = fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(contents.contains("quickCapture"));
        assert!(contents.contains("bottom-right"));
    }
}
