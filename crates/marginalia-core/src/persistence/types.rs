//! Persistence data types.
//!
//! # Data Model Overview
//!
//! Marginalia persists two JSON files in its data directory:
//!
//! ```text
//! <data dir>/
//! ├── notes.json       # Array of notes, in display order
//! └── settings.json    # App settings (quick capture popup)
//! ```
//!
//! The notes array order IS the display order. Nothing is sorted by
//! timestamp; pinning and manual reordering decide where a note appears.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// Note Types
// ============================================================================

/// A single note.
///
/// Serialized camelCase so the file stays readable by the web-view shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque unique identifier, immutable after creation.
    pub id: String,

    /// User-visible title. No length limit at this layer.
    pub title: String,

    /// Rich text body as sanitized markup (b/i/u/br/p/div).
    pub body: String,

    /// Creation time in epoch milliseconds.
    pub created_at: i64,

    /// Last title/body edit in epoch milliseconds.
    pub updated_at: i64,

    /// Pin flag. Absent on notes that were never pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl Note {
    /// Create a note with a fresh id, stamped `now`.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
            pinned: None,
        }
    }

    /// Create an empty note, as the "new note" action does.
    pub fn empty() -> Self {
        Self::new("", "")
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned == Some(true)
    }

    /// Refresh `updated_at` without ever moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at).max(self.created_at);
    }
}

/// A `{title, body}` pair produced by an import adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedNote {
    pub title: String,
    pub body: String,
}

impl ImportedNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

// ============================================================================
// Settings Types
// ============================================================================

/// App settings saved to `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Global quick capture popup.
    #[serde(default)]
    pub quick_capture: QuickCaptureSettings,
}

/// Quick capture popup settings.
///
/// Each field falls back to its default on its own, so one bad value in a
/// hand-edited file does not reset the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickCaptureSettings {
    /// Whether the global shortcut opens the popup.
    #[serde(default = "default_true", deserialize_with = "enabled_or_default")]
    pub enabled: bool,

    /// Where on screen the popup appears.
    #[serde(default, deserialize_with = "position_or_default")]
    pub position: QuickCapturePosition,
}

impl Default for QuickCaptureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            position: QuickCapturePosition::default(),
        }
    }
}

/// Helper for serde default value.
fn default_true() -> bool {
    true
}

fn enabled_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or_else(|| {
        log::warn!("Invalid quickCapture.enabled {}, using default", value);
        default_true()
    }))
}

fn position_or_default<'de, D>(deserializer: D) -> Result<QuickCapturePosition, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value.as_str().map(str::parse::<QuickCapturePosition>) {
        Some(Ok(position)) => Ok(position),
        _ => {
            log::warn!("Unknown quick capture position {}, using default", value);
            Ok(QuickCapturePosition::default())
        }
    }
}

/// Screen anchor for the quick capture popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuickCapturePosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl QuickCapturePosition {
    pub const ALL: [QuickCapturePosition; 9] = [
        QuickCapturePosition::TopLeft,
        QuickCapturePosition::TopCenter,
        QuickCapturePosition::TopRight,
        QuickCapturePosition::CenterLeft,
        QuickCapturePosition::Center,
        QuickCapturePosition::CenterRight,
        QuickCapturePosition::BottomLeft,
        QuickCapturePosition::BottomCenter,
        QuickCapturePosition::BottomRight,
    ];

    /// The kebab-case name used on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickCapturePosition::TopLeft => "top-left",
            QuickCapturePosition::TopCenter => "top-center",
            QuickCapturePosition::TopRight => "top-right",
            QuickCapturePosition::CenterLeft => "center-left",
            QuickCapturePosition::Center => "center",
            QuickCapturePosition::CenterRight => "center-right",
            QuickCapturePosition::BottomLeft => "bottom-left",
            QuickCapturePosition::BottomCenter => "bottom-center",
            QuickCapturePosition::BottomRight => "bottom-right",
        }
    }
}

impl std::fmt::Display for QuickCapturePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuickCapturePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown quick capture position: {s}"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_roundtrip() {
        let mut note = Note::new("Title", "<b>Body</b>");
        note.pinned = Some(true);

        let json = serde_json::to_string(&note).unwrap();
        let parsed: Note = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, note);
    }

    #[test]
    fn camel_case_serialization() {
        let note = Note::new("Title", "Body");
        let json = serde_json::to_string(&note).unwrap();

        assert!(json.contains("createdAt"));
        assert!(json.contains("updatedAt"));
        assert!(!json.contains("created_at"));
    }

    #[test]
    fn unpinned_note_omits_pinned_field() {
        let note = Note::empty();
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("pinned"));
        assert!(!note.is_pinned());
    }

    #[test]
    fn loads_note_written_by_web_shell() {
        let json = r#"{
            "id": "welcome",
            "title": "Welcome",
            "body": "Hello<br>world",
            "createdAt": 1700000000000,
            "updatedAt": 1700000005000
        }"#;

        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id, "welcome");
        assert_eq!(note.pinned, None);
        assert_eq!(note.updated_at - note.created_at, 5000);
    }

    #[test]
    fn new_notes_get_distinct_ids() {
        let a = Note::empty();
        let b = Note::empty();
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut note = Note::empty();
        note.created_at = i64::MAX - 10;
        note.updated_at = i64::MAX - 5;

        note.touch();

        assert_eq!(note.updated_at, i64::MAX - 5);
        assert!(note.updated_at >= note.created_at);
    }

    #[test]
    fn settings_defaults() {
        let settings = AppSettings::default();
        assert!(settings.quick_capture.enabled);
        assert_eq!(
            settings.quick_capture.position,
            QuickCapturePosition::BottomRight
        );
    }

    #[test]
    fn settings_missing_fields_take_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"quickCapture": {"enabled": false}}"#).unwrap();
        assert!(!parsed.quick_capture.enabled);
        assert_eq!(
            parsed.quick_capture.position,
            QuickCapturePosition::BottomRight
        );

        let parsed: AppSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AppSettings::default());
    }

    #[test]
    fn position_uses_kebab_case() {
        let json = serde_json::to_string(&QuickCapturePosition::TopCenter).unwrap();
        assert_eq!(json, "\"top-center\"");

        for position in QuickCapturePosition::ALL {
            let parsed: QuickCapturePosition = position.as_str().parse().unwrap();
            assert_eq!(parsed, position);
        }
        assert!("middle".parse::<QuickCapturePosition>().is_err());
    }
}
