//! Display width of terminal text.
//!
//! Widths come from Unicode East Asian Width (via `unicode-width`) with
//! grapheme clusters measured as one unit, so emoji sequences and combining
//! marks count the way terminals draw them. ANSI escapes are zero width.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::strip_ansi_codes;

/// Display width of a grapheme cluster in terminal cells.
///
/// 1. Single codepoint: its East Asian Width (control characters are 0)
/// 2. Regional indicator pair (flags) or emoji sequence (ZWJ, VS16, skin tone, keycap): 2
/// 3. Base + combining marks: width of the base
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };

    if grapheme.len() == first.len_utf8() {
        return first.width().unwrap_or(0);
    }

    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    for c in chars {
        match c as u32 {
            0x200D | 0xFE0F | 0x20E3 => return 2,
            0x1F3FB..=0x1F3FF => return 2,
            _ => {}
        }
    }

    first.width().unwrap_or(0)
}

/// Width of text that contains no escape sequences.
pub(crate) fn plain_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// Display width of a string in terminal cells, ignoring ANSI escapes.
pub fn string_width(text: &str) -> usize {
    plain_width(&strip_ansi_codes(text))
}
