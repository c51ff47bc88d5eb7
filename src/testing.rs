//! Recording fakes shared by unit tests.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::container::Container;
use crate::engine::RenderEngine;
use crate::terminal::{ConsoleSize, OutputSink};
use crate::text::ResolvedItem;

/// Sink that keeps every write.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
    writes: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Interleave a marker with real writes to check ordering.
    pub(crate) fn push_marker(&self, marker: &str) {
        self.writes.borrow_mut().push(marker.to_string());
    }
}

impl OutputSink for RecordingSink {
    fn write_text(&self, text: &str) -> io::Result<()> {
        self.writes.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Render(Vec<ResolvedItem>, Option<ConsoleSize>),
    Clear(Option<ConsoleSize>),
    Once(Vec<ResolvedItem>, Option<ConsoleSize>),
}

/// Engine that records its inputs and always has output.
///
/// Transcripts are `render:a|b`, `clear` and `once:a|b`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingEngine {
    calls: Rc<RefCell<Vec<EngineCall>>>,
}

impl RecordingEngine {
    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn render_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, EngineCall::Render(..)))
            .count()
    }
}

fn joined(items: &[ResolvedItem]) -> String {
    items
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

impl RenderEngine for RecordingEngine {
    fn render_text(&mut self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String> {
        self.calls
            .borrow_mut()
            .push(EngineCall::Render(items.to_vec(), size));
        Some(format!("render:{}", joined(items)))
    }

    fn clear_text(&mut self, size: Option<ConsoleSize>) -> Option<String> {
        self.calls.borrow_mut().push(EngineCall::Clear(size));
        Some("clear".to_string())
    }

    fn render_once(&self, items: &[ResolvedItem], size: Option<ConsoleSize>) -> Option<String> {
        self.calls
            .borrow_mut()
            .push(EngineCall::Once(items.to_vec(), size));
        (!items.is_empty()).then(|| format!("once:{}", joined(items)))
    }
}

/// Container over recording fakes. `None` makes the size provider fail.
pub(crate) fn recording_container(
    size: Option<ConsoleSize>,
) -> (Container, RecordingEngine, RecordingSink) {
    let engine = RecordingEngine::default();
    let sink = RecordingSink::default();
    let container = Container::new(engine.clone(), sink.clone(), move || {
        size.ok_or_else(|| io::Error::other("not a terminal"))
    });
    (container, engine, sink)
}
