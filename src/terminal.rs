//! Terminal collaborators.
//!
//! The container never talks to the terminal directly. It asks a
//! [`SizeProvider`] for the current dimensions and hands finished escape
//! transcripts to an [`OutputSink`].
//!
//! - [`TerminalSize`] queries the real terminal through crossterm
//! - [`ConsoleOutput`] writes to stdout or stderr

use std::io::{self, Write};

use crate::config::OutputTarget;

// =============================================================================
// Console Size
// =============================================================================

/// Terminal dimensions in cells.
///
/// An unknown size is expressed as `Option<ConsoleSize>::None` throughout the
/// crate, never as a zeroed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsoleSize {
    pub cols: u16,
    pub rows: u16,
}

impl ConsoleSize {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl From<(u16, u16)> for ConsoleSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}

// =============================================================================
// Size Provider
// =============================================================================

/// Source of the current terminal dimensions.
///
/// Failures (not a terminal, unsupported query) are treated by the container
/// as an unknown size and never propagated.
pub trait SizeProvider {
    fn size(&self) -> io::Result<ConsoleSize>;
}

impl<F> SizeProvider for F
where
    F: Fn() -> io::Result<ConsoleSize>,
{
    fn size(&self) -> io::Result<ConsoleSize> {
        self()
    }
}

/// Size provider backed by the real terminal.
///
/// Uses crossterm to query the terminal dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSize;

impl SizeProvider for TerminalSize {
    fn size(&self) -> io::Result<ConsoleSize> {
        crossterm::terminal::size().map(ConsoleSize::from)
    }
}

// =============================================================================
// Output Sink
// =============================================================================

/// Destination for rendered escape transcripts.
///
/// Implementations must write the whole buffer: a single underlying write is
/// not guaranteed to consume every byte.
pub trait OutputSink {
    fn write_text(&self, text: &str) -> io::Result<()>;
}

/// Standard stream output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleOutput {
    Stdout,
    #[default]
    Stderr,
}

impl OutputSink for ConsoleOutput {
    fn write_text(&self, text: &str) -> io::Result<()> {
        match self {
            ConsoleOutput::Stdout => write_fully(&mut io::stdout().lock(), text),
            ConsoleOutput::Stderr => write_fully(&mut io::stderr().lock(), text),
        }
    }
}

impl From<OutputTarget> for ConsoleOutput {
    fn from(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => ConsoleOutput::Stdout,
            OutputTarget::Stderr => ConsoleOutput::Stderr,
        }
    }
}

/// `write_all` retries short writes and `Interrupted` until the buffer is drained.
fn write_fully<W: Write>(w: &mut W, text: &str) -> io::Result<()> {
    w.write_all(text.as_bytes())?;
    w.flush()
}

// =============================================================================
// Tests
// =============================================================================
