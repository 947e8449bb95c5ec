//! Notes shown on first run, before anything has been saved.

use crate::persistence::{now_millis, Note};

const HOUR_MS: i64 = 60 * 60 * 1000;

fn seed_note(id: &str, title: &str, body: &str, age_ms: i64, now: i64) -> Note {
    Note {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        created_at: now - age_ms,
        updated_at: now - age_ms,
        pinned: None,
    }
}

/// The first-run collection, oldest first.
pub fn default_notes() -> Vec<Note> {
    let now = now_millis();
    vec![
        seed_note(
            "welcome",
            "Welcome to Marginalia",
            "A quiet place for thinking, where ideas can grow and connect.<br><br>\
             Create a note with the button below or press ⌘N. Search with ⌘K.",
            48 * HOUR_MS,
            now,
        ),
        seed_note(
            "notation",
            "On the Art of Notation",
            "Good notes are translations, not transcriptions: a raw thought given \
             just enough structure to survive.<br><br>Write freely. Edit ruthlessly.",
            24 * HOUR_MS,
            now,
        ),
        seed_note(
            "spring",
            "Spring Physics",
            "Nothing in this app stops abruptly or starts from zero.<br><br>\
             Good animation is invisible. You feel it rather than see it.",
            12 * HOUR_MS,
            now,
        ),
    ]
}
