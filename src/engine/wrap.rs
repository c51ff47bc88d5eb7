//! Word wrapping with hanging indent.
//!
//! Breaks at whitespace, falls back to grapheme breaks for words wider than
//! the line, and treats ANSI escape sequences as zero-width tokens glued to
//! the surrounding text. Every line after the first one of an item starts
//! with `hanging_indent` spaces. Explicit `\n` is a hard break.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::escape_sequence_end;
use super::width::{grapheme_width, plain_width};

/// Lay out one text item into terminal lines.
///
/// Without a width the text only breaks at explicit newlines.
pub fn wrap_item(text: &str, hanging_indent: u16, max_width: Option<usize>) -> Vec<String> {
    match max_width {
        Some(max_width) if max_width > 0 => wrap_hanging(text, max_width, hanging_indent),
        _ => {
            let indent = " ".repeat(hanging_indent as usize);
            text.split('\n')
                .enumerate()
                .map(|(index, line)| {
                    let line = if index == 0 {
                        line.to_string()
                    } else {
                        format!("{indent}{line}")
                    };
                    line.trim_end().to_string()
                })
                .collect()
        }
    }
}

/// Word-wrap `text` to `max_width` cells.
///
/// The indent is clamped so continuation lines keep at least one usable cell.
pub fn wrap_hanging(text: &str, max_width: usize, hanging_indent: u16) -> Vec<String> {
    let mut wrapper = LineWrapper {
        lines: Vec::new(),
        current: String::new(),
        width: 0,
        has_content: false,
        max_width: max_width.max(1),
        indent: (hanging_indent as usize).min(max_width.saturating_sub(1)),
    };

    for (index, raw_line) in text.split('\n').enumerate() {
        if index > 0 {
            wrapper.break_line();
        }
        for token in tokenize(raw_line) {
            wrapper.push(token);
        }
    }

    wrapper.finish()
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Escape(&'a str),
    Space(&'a str),
    Word(&'a str),
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1B {
            let end = escape_sequence_end(bytes, i);
            tokens.push(Token::Escape(&line[i..end]));
            i = end;
            continue;
        }

        let rest = &line[i..];
        let is_space = rest.starts_with(char::is_whitespace);
        let mut end = i;
        for (offset, c) in rest.char_indices() {
            if c == '\x1b' || c.is_whitespace() != is_space {
                break;
            }
            end = i + offset + c.len_utf8();
        }

        let run = &line[i..end];
        tokens.push(if is_space { Token::Space(run) } else { Token::Word(run) });
        i = end;
    }

    tokens
}

// =============================================================================
// Line Wrapper
// =============================================================================

struct LineWrapper {
    lines: Vec<String>,
    current: String,
    width: usize,
    /// False while the line holds nothing but its indent.
    has_content: bool,
    max_width: usize,
    indent: usize,
}

impl LineWrapper {
    /// Close the current line and open an indented continuation line.
    fn break_line(&mut self) {
        let line = std::mem::replace(&mut self.current, " ".repeat(self.indent));
        self.lines.push(line.trim_end().to_string());
        self.width = self.indent;
        self.has_content = false;
    }

    fn push(&mut self, token: Token<'_>) {
        let (run, is_space) = match token {
            Token::Escape(seq) => {
                self.current.push_str(seq);
                return;
            }
            Token::Space(run) => (run, true),
            Token::Word(run) => (run, false),
        };

        let run_width = plain_width(run);
        if self.width + run_width > self.max_width && self.has_content {
            self.break_line();
            // Whitespace that caused the break is dropped.
            if is_space {
                return;
            }
        }

        if self.width + run_width > self.max_width {
            self.force_break(run);
        } else {
            self.current.push_str(run);
            self.width += run_width;
            self.has_content = true;
        }
    }

    /// Break a run wider than the line at grapheme boundaries.
    fn force_break(&mut self, run: &str) {
        for grapheme in run.graphemes(true) {
            let gw = grapheme_width(grapheme);
            if self.width + gw > self.max_width && self.has_content {
                self.break_line();
            }
            self.current.push_str(grapheme);
            self.width += gw;
            self.has_content = true;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.lines.push(self.current.trim_end().to_string());
        self.lines
    }
}
