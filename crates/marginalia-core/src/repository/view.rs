//! Derived views over the note collection.

use crate::html::to_plain_text;
use crate::persistence::Note;

/// Whether `note` matches an already-lowercased query.
fn matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || to_plain_text(&note.body).to_lowercase().contains(needle)
}

/// Notes matching `query`, pinned first, each partition in collection
/// order. A blank query matches everything.
pub fn filtered_view(notes: &[Note], query: &str) -> Vec<Note> {
    let needle = query.trim().to_lowercase();
    let (pinned, unpinned): (Vec<&Note>, Vec<&Note>) = notes
        .iter()
        .filter(|n| needle.is_empty() || matches(n, &needle))
        .partition(|n| n.is_pinned());

    pinned.into_iter().chain(unpinned).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_note(id: &str, title: &str, body: &str, pinned: bool) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: 0,
            updated_at: 0,
            pinned: pinned.then_some(true),
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn empty_query_partitions_pinned_first() {
        let notes = vec![
            make_note("A", "A", "", true),
            make_note("B", "B", "", false),
            make_note("C", "C", "", true),
            make_note("D", "D", "", false),
        ];

        assert_eq!(ids(&filtered_view(&notes, "")), vec!["A", "C", "B", "D"]);
        assert_eq!(ids(&filtered_view(&notes, "   ")), vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn matches_title_case_insensitively() {
        let notes = vec![
            make_note("1", "Shopping List", "", false),
            make_note("2", "Meeting", "", false),
        ];

        assert_eq!(ids(&filtered_view(&notes, "shopping")), vec!["1"]);
        assert_eq!(ids(&filtered_view(&notes, "MEET")), vec!["2"]);
    }

    #[test]
    fn matches_body_text_not_markup() {
        let notes = vec![
            make_note("1", "", "<b>bold</b> idea", false),
            make_note("2", "", "plain", false),
        ];

        assert_eq!(ids(&filtered_view(&notes, "bold idea")), vec!["1"]);
        // Tag names are not searchable text
        assert!(filtered_view(&notes, "<b>").is_empty());
        assert!(filtered_view(&notes, "div").is_empty());
    }

    #[test]
    fn filtered_matches_keep_partition_order() {
        let notes = vec![
            make_note("1", "rust one", "", false),
            make_note("2", "other", "", true),
            make_note("3", "rust three", "", true),
            make_note("4", "rust four", "", false),
        ];

        assert_eq!(ids(&filtered_view(&notes, "rust")), vec!["3", "1", "4"]);
    }

    #[test]
    fn no_match_is_empty() {
        let notes = vec![make_note("1", "A", "B", false)];
        assert!(filtered_view(&notes, "zzz").is_empty());
    }
}
