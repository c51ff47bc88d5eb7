//! Line-diffing renderer for the persistent block.
//!
//! Like an inline renderer, `StaticText` writes to the normal terminal buffer
//! and redraws in place. Instead of erasing the whole block every frame it:
//!
//! - Moves to the start of the previously drawn block
//! - Overwrites line by line, erasing the tail of lines that got shorter
//! - Erases everything below when the new block has fewer lines
//! - Returns nothing at all when the frame is unchanged
//!
//! On a size change the previous frame is re-laid-out at the new width to
//! find where the block starts, and the block is erased before drawing.

use super::ansi;
use super::width::string_width;
use super::wrap::wrap_item;
use super::RenderEngine;
use crate::terminal::ConsoleSize;
use crate::text::ResolvedItem;

/// One laid-out terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    width: usize,
}

impl Line {
    fn new(text: String) -> Self {
        let width = string_width(&text);
        Self { text, width }
    }
}

/// What is currently on screen.
#[derive(Debug, Clone)]
struct DrawnFrame {
    items: Vec<ResolvedItem>,
    size: Option<ConsoleSize>,
    lines: Vec<Line>,
}

/// Diffing static text renderer.
///
/// Keeps track of the previous frame; one instance per persistent block.
#[derive(Debug, Clone)]
pub struct StaticText {
    drawn: Option<DrawnFrame>,
    keep_cursor_zero_column: bool,
}

impl StaticText {
    /// Create a renderer with nothing drawn.
    pub fn new() -> Self {
        Self {
            drawn: None,
            keep_cursor_zero_column: true,
        }
    }

    /// Whether every transcript ends by moving the cursor to column 0.
    pub fn keep_cursor_zero_column(mut self, keep: bool) -> Self {
        self.keep_cursor_zero_column = keep;
        self
    }

    /// Number of terminal lines currently drawn.
    pub fn drawn_height(&self) -> usize {
        self.drawn.as_ref().map_or(0, |frame| frame.lines.len())
    }

    /// Forget the drawn frame without erasing it.
    ///
    /// Next render draws from the cursor position as if nothing was on screen.
    pub fn invalidate(&mut self) {
        self.drawn = None;
    }

    /// Previously drawn lines as they occupy the terminal at `size`.
    fn take_drawn_lines(&mut self, size: Option<ConsoleSize>) -> (Vec<Line>, bool) {
        match self.drawn.take() {
            None => (Vec::new(), false),
            Some(frame) if frame.size == size => (frame.lines, false),
            Some(frame) => (layout(&frame.items, size), true),
        }
    }
}

impl Default for StaticText {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for StaticText {
    fn render_text(&mut self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String> {
        let new_lines = layout(items, size);
        let (last_lines, size_changed) = self.take_drawn_lines(size);
        let resized = size_changed && !last_lines.is_empty();

        let unchanged = !resized && last_lines == new_lines;
        if !new_lines.is_empty() {
            self.drawn = Some(DrawnFrame {
                items: items.to_vec(),
                size,
                lines: new_lines.clone(),
            });
        }
        if unchanged {
            return None;
        }

        let mut out = String::new();
        if !last_lines.is_empty() {
            ansi::cursor_column_zero(&mut out);
            ansi::cursor_up(&mut out, last_lines.len() - 1);
            if resized {
                ansi::erase_down(&mut out);
            }
        }

        let erase_below = !resized && last_lines.len() > new_lines.len();
        for (index, line) in new_lines.iter().enumerate() {
            if index > 0 {
                out.push_str("\r\n");
            }
            out.push_str(&line.text);

            let is_last = index + 1 == new_lines.len();
            if resized || (erase_below && is_last) {
                continue;
            }
            if last_lines.get(index).is_some_and(|prev| prev.width > line.width) {
                ansi::erase_line_right(&mut out);
            }
        }

        if erase_below {
            ansi::erase_down(&mut out);
        }
        if self.keep_cursor_zero_column {
            ansi::cursor_column_zero(&mut out);
        }

        Some(out)
    }

    fn clear_text(&mut self, size: Option<ConsoleSize>) -> Option<String> {
        let (last_lines, _) = self.take_drawn_lines(size);
        if last_lines.is_empty() {
            return None;
        }

        let mut out = String::new();
        ansi::cursor_column_zero(&mut out);
        ansi::cursor_up(&mut out, last_lines.len() - 1);
        ansi::erase_down(&mut out);
        Some(out)
    }

    fn render_once(&self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String> {
        let lines = layout(items, size);
        if lines.is_empty() {
            return None;
        }
        Some(
            lines
                .into_iter()
                .map(|line| line.text)
                .collect::<Vec<_>>()
                .join("\r\n"),
        )
    }
}

/// Wrap every item at the terminal width and keep the last `rows` lines.
fn layout(items: &[ResolvedItem], size: Option<ConsoleSize>) -> Vec<Line> {
    let cols = size.map(|s| s.cols as usize).filter(|&cols| cols > 0);

    let mut lines: Vec<Line> = items
        .iter()
        .flat_map(|item| wrap_item(&item.text, item.hanging_indent, cols))
        .map(Line::new)
        .collect();

    if let Some(rows) = size.map(|s| s.rows as usize).filter(|&rows| rows > 0) {
        if lines.len() > rows {
            lines.drain(..lines.len() - rows);
        }
    }

    lines
}

// =============================================================================
// Tests
// =============================================================================
