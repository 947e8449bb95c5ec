//! Markdown export.
//!
//! Writes one `<title>.md` file per note into a directory. File names are
//! derived from titles, made filesystem-safe, and de-duplicated
//! case-insensitively so notes with the same title never overwrite each
//! other (also on case-insensitive filesystems).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use std::sync::LazyLock;

use crate::html::to_plain_text;
use crate::persistence::{Note, StoreError};

const UNTITLED: &str = "Untitled";
const MAX_NAME_CHARS: usize = 100;

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Title to show for a note, `Untitled` for an empty one.
pub fn display_title(note: &Note) -> &str {
    if note.title.is_empty() {
        UNTITLED
    } else {
        &note.title
    }
}

/// Filesystem-safe base name for a note title (without extension).
pub fn export_file_stem(title: &str) -> String {
    let title = if title.is_empty() { UNTITLED } else { title };
    let safe = UNSAFE_CHARS_RE.replace_all(title, "-");
    let collapsed = WHITESPACE_RE.replace_all(&safe, " ");
    let stem: String = collapsed.trim().chars().take(MAX_NAME_CHARS).collect();

    if stem.is_empty() {
        UNTITLED.to_string()
    } else {
        stem
    }
}

/// Markdown document for a single note.
pub fn render_markdown(note: &Note) -> String {
    format!("# {}\n\n{}\n", display_title(note), to_plain_text(&note.body))
}

/// Write every note as markdown into `dir`, returning the written paths in
/// note order.
pub fn export_markdown(notes: &[Note], dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    fs::create_dir_all(dir)?;

    let mut used_names: HashSet<String> = HashSet::new();
    let mut written = Vec::with_capacity(notes.len());

    for note in notes {
        let base = export_file_stem(&note.title);
        let mut name = base.clone();
        let mut suffix = 2;
        while used_names.contains(&name.to_lowercase()) {
            name = format!("{base} {suffix}");
            suffix += 1;
        }
        used_names.insert(name.to_lowercase());

        let path = dir.join(format!("{name}.md"));
        fs::write(&path, render_markdown(note))?;
        written.push(path);
    }

    log::info!("Exported {} notes to {}", written.len(), dir.display());
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
