//! Rendering engine - the "blind" transcript layer.
//!
//! The engine knows only about resolved text items and terminal dimensions.
//! It doesn't understand scopes, deferred content or timing. It turns a list
//! of [`ResolvedItem`]s into the escape transcript that transforms the
//! previously drawn frame into the new one.
//!
//! # Architecture
//!
//! ```text
//! Scopes → Container (resolve items) → RenderEngine → OutputSink → Terminal
//! ```
//!
//! - [`RenderEngine`] is the seam the container talks to
//! - [`StaticText`] is the bundled line-diffing implementation
//! - [`ansi`], [`width`] and [`wrap`] are the text utilities it is built on

pub mod ansi;
pub mod static_text;
pub mod width;
pub mod wrap;

pub use ansi::strip_ansi_codes;
pub use static_text::StaticText;
pub use width::string_width;

use crate::terminal::ConsoleSize;
use crate::text::ResolvedItem;

/// Computes escape transcripts for a persistent block.
///
/// Implementations keep the previously drawn frame as private state, so one
/// engine instance must never be shared between containers. `None` (or an
/// empty string) means there is nothing to write.
pub trait RenderEngine {
    /// Transcript transforming the previous frame into `items`.
    fn render_text(&mut self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String>;

    /// Transcript erasing the currently drawn frame.
    fn clear_text(&mut self, size: Option<ConsoleSize>) -> Option<String>;

    /// One-shot, non-diffed transcript for ephemeral output.
    fn render_once(&self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String>;
}

/// Lay out `items` once without any diff state.
pub fn render_once(items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String> {
    StaticText::new().render_once(items, size)
}
