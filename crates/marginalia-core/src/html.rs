//! Plain-text projection of note bodies.
//!
//! Bodies are stored as a small markup subset (b/i/u/br/p/div). Search and
//! export work on the text a reader would see, so tags are stripped and
//! block boundaries become newlines.

use regex::Regex;
use std::sync::LazyLock;

static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(div|p|li)>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip markup, turning `<br>` and closing block tags into newlines.
pub fn to_plain_text(markup: &str) -> String {
    let text = LINE_BREAK_RE.replace_all(markup, "\n");
    let text = BLOCK_END_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");

    // &amp; last so "&amp;lt;" decodes to "&lt;" and not "<"
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");

    BLANK_LINES_RE
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}
