//! # static-text
//!
//! Text pinned below regular terminal output.
//!
//! Progress lines, spinners and status messages live in a persistent block at
//! the bottom of the terminal, while ordinary log lines scroll above it. The
//! block is redrawn in place with a minimal escape transcript.
//!
//! ## Architecture
//!
//! ```text
//! Scope::set_text → Container → resolve_items → RenderEngine → OutputSink
//!                       ↑
//!                RenderInterval (ticks while there is content)
//! ```
//!
//! ## Modules
//!
//! - [`text`] - Text items (literal, deferred, hanging indent) and the resolver
//! - [`container`] - Container and scopes
//! - [`interval`] - Adaptive, reference-counted redraw timer
//! - [`engine`] - Render engine trait and the bundled line-diffing engine
//! - [`terminal`] - Terminal size and output collaborators
//! - [`config`] - Serde configuration with environment overrides
//!
//! ## Example
//!
//! ```ignore
//! use static_text::{Container, RenderInterval, TextItem};
//!
//! let container = Container::stderr();
//! let interval = RenderInterval::new(container.clone());
//! let scope = container.create_scope();
//!
//! let activation = interval.start()?;
//! scope.set_text(TextItem::deferred(|size| format!("{:?}", size)));
//! container.log_above("step one done", None)?;
//! activation.release()?;
//! ```

pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod interval;
pub mod terminal;
pub mod text;

#[cfg(test)]
mod testing;

pub use config::{Config, OutputTarget};
pub use container::{Container, Scope};
pub use engine::{RenderEngine, StaticText, render_once, string_width, strip_ansi_codes};
pub use error::{BoxError, Error, Result};
pub use interval::{Activation, IntervalPhase, RenderInterval};
pub use terminal::{ConsoleOutput, ConsoleSize, OutputSink, SizeProvider, TerminalSize};
pub use text::{Deferred, DetailedText, ResolvedItem, TextItem, TextValue, resolve_items};
