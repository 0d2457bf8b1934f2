//! Display-width-aware text helpers used by the card and list renderers.

use unicode_width::UnicodeWidthChar;

/// Truncate a string to a maximum display width, appending an ellipsis when
/// anything was cut. Width accounting is by terminal cells, not chars, so
/// wide (CJK) glyphs are not over-counted.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let total: usize = text.chars().map(|ch| ch.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }

    // One cell stays reserved for the ellipsis.
    let budget = max_width - 1;
    let mut width = 0usize;
    let mut cut = text.len();
    for (idx, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > budget {
            cut = idx;
            break;
        }
        width += ch_width;
    }

    let mut truncated = text[..cut].trim_end().to_string();
    truncated.push('…');
    truncated
}

/// Collapse internal newlines so a multi-line field fits on a single card row.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
