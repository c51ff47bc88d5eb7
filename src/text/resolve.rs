//! Lazy flattening of text items.
//!
//! Walks a tree of items depth-first with an explicit stack instead of
//! recursion. Deferred closures are evaluated when the walk reaches them, so
//! a consumer that stops early never calls the closures further down.

use std::borrow::Cow;
use std::{slice, vec};

use super::{Deferred, DetailedText, ResolvedItem, TextItem};
use crate::error::{Error, Result};
use crate::terminal::ConsoleSize;

/// Resolve `items` into render-ready text.
///
/// Output order is item order, with deferred results spliced in place.
/// Empty strings are dropped at every depth. A failing deferred closure
/// yields one `Err` and ends the sequence.
pub fn resolve_items(items: &[TextItem], size: Option<ConsoleSize>) -> ResolveItems<'_> {
    ResolveItems {
        stack: vec![Frame {
            pending: Pending::Borrowed(items.iter()),
            indent: 0,
        }],
        size,
        failed: false,
    }
}

enum Pending<'a> {
    Borrowed(slice::Iter<'a, TextItem>),
    Owned(vec::IntoIter<TextItem>),
}

impl<'a> Pending<'a> {
    fn next(&mut self) -> Option<Cow<'a, TextItem>> {
        match self {
            Pending::Borrowed(iter) => iter.next().map(Cow::Borrowed),
            Pending::Owned(iter) => iter.next().map(Cow::Owned),
        }
    }
}

/// Items still to visit at one depth, plus the indent accumulated so far.
struct Frame<'a> {
    pending: Pending<'a>,
    indent: u16,
}

/// Iterator returned by [`resolve_items`].
pub struct ResolveItems<'a> {
    stack: Vec<Frame<'a>>,
    size: Option<ConsoleSize>,
    failed: bool,
}

impl ResolveItems<'_> {
    /// Evaluate a deferred item and descend into whatever it returned.
    fn descend(&mut self, deferred: &Deferred, indent: u16) -> Option<Error> {
        match deferred.evaluate(self.size) {
            Ok(value) => {
                self.stack.push(Frame {
                    pending: Pending::Owned(value.into_items().into_iter()),
                    indent,
                });
                None
            }
            Err(err) => {
                self.failed = true;
                self.stack.clear();
                Some(Error::Deferred(err))
            }
        }
    }
}

fn emit(text: &str, indent: u16) -> Option<ResolvedItem> {
    (!text.is_empty()).then(|| ResolvedItem::new(text, indent))
}

impl Iterator for ResolveItems<'_> {
    type Item = Result<ResolvedItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let frame = self.stack.last_mut()?;
            let indent = frame.indent;
            let Some(item) = frame.pending.next() else {
                self.stack.pop();
                continue;
            };

            match &*item {
                TextItem::Literal(text) => {
                    if let Some(resolved) = emit(text, indent) {
                        return Some(Ok(resolved));
                    }
                }
                TextItem::Deferred(deferred) => {
                    if let Some(err) = self.descend(deferred, indent) {
                        return Some(Err(err));
                    }
                }
                TextItem::Detailed { text, hanging_indent } => {
                    let indent = indent.saturating_add(*hanging_indent);
                    match text {
                        DetailedText::Text(text) => {
                            if let Some(resolved) = emit(text, indent) {
                                return Some(Ok(resolved));
                            }
                        }
                        DetailedText::Deferred(deferred) => {
                            if let Some(err) = self.descend(deferred, indent) {
                                return Some(Err(err));
                            }
                        }
                    }
                }
            }
        }
    }
}
