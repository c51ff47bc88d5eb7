//! ANSI escape sequences.
//!
//! The handful of cursor and erase sequences the static text engine emits,
//! plus escape stripping for width measurement. Handles:
//! - CSI sequences: `ESC [` ... final byte (0x40-0x7E)
//! - OSC sequences: `ESC ]` ... BEL (0x07) or ST (ESC \)
//! - DCS/PM/APC sequences: `ESC P`/`ESC ^`/`ESC _` ... ST
//! - Two-character sequences: `ESC` + single char

use std::borrow::Cow;
use std::fmt::Write;

// =============================================================================
// Cursor Movement
// =============================================================================

/// Move cursor up by n rows.
#[inline]
pub fn cursor_up(out: &mut String, n: usize) {
    if n > 0 {
        let _ = write!(out, "\x1b[{}A", n);
    }
}

/// Move cursor to beginning of line.
#[inline]
pub fn cursor_column_zero(out: &mut String) {
    out.push_str("\x1b[G");
}

// =============================================================================
// Erasing
// =============================================================================

/// Erase from cursor to end of line.
#[inline]
pub fn erase_line_right(out: &mut String) {
    out.push_str("\x1b[K");
}

/// Erase from cursor to end of screen.
#[inline]
pub fn erase_down(out: &mut String) {
    out.push_str("\x1b[J");
}

// =============================================================================
// Stripping
// =============================================================================

/// Strip ANSI escape sequences from a string.
///
/// Returns `Cow::Borrowed` when no escape sequences are present (zero allocation).
pub fn strip_ansi_codes(s: &str) -> Cow<'_, str> {
    if !s.as_bytes().contains(&0x1B) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1B {
            i = escape_sequence_end(bytes, i);
        } else {
            // ESC is a single byte, so every ESC position is a char boundary.
            let start = i;
            while i < bytes.len() && bytes[i] != 0x1B {
                i += 1;
            }
            result.push_str(&s[start..i]);
        }
    }

    Cow::Owned(result)
}

/// Byte index just past the escape sequence starting at `pos` (an ESC byte).
///
/// Always lands on a char boundary.
pub(crate) fn escape_sequence_end(bytes: &[u8], pos: usize) -> usize {
    let next = pos + 1;
    if next >= bytes.len() {
        return bytes.len();
    }

    match bytes[next] {
        b'[' => skip_csi(bytes, next + 1),
        b']' | b'P' | b'^' | b'_' => skip_string_terminated(bytes, next + 1),
        b if b.is_ascii() => next + 1,
        // ESC followed by a multi-byte char: drop the lone ESC only.
        _ => next,
    }
}

/// `pos` is the byte after `[`.
fn skip_csi(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;

    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7E).contains(&b) {
            return i + 1;
        }
        if !(0x20..=0x7E).contains(&b) {
            return i;
        }
        i += 1;
    }

    bytes.len()
}

/// `pos` is the byte after the type indicator. Ends at BEL or ST.
fn skip_string_terminated(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;

    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            0x1B if i + 1 < bytes.len() && bytes[i + 1] == b'\\' => return i + 2,
            _ => i += 1,
        }
    }

    bytes.len()
}
