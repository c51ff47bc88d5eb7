//! Text items - what producers declare.
//!
//! A producer describes its content as a list of [`TextItem`]s. Items can be:
//! - Literal strings
//! - Deferred closures (called on every draw, may return one item or a list)
//! - Detailed items carrying a hanging indent for wrapped lines
//!
//! Deferred items are the reason nothing here is cached: a closure may read a
//! clock, a counter or the terminal width, so content is re-evaluated by
//! [`resolve_items`] each time the block is drawn.
//!
//! # Example
//!
//! ```ignore
//! use static_text::text::{Deferred, TextItem, TextValue};
//!
//! let started = std::time::Instant::now();
//! let value: TextValue = vec![
//!     TextItem::from("Downloading..."),
//!     TextItem::hanging(Deferred::new(move |_size| {
//!         format!("elapsed: {:?}", started.elapsed())
//!     }), 2),
//! ]
//! .into();
//! ```

mod resolve;

pub use resolve::{ResolveItems, resolve_items};

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BoxError, Result};
use crate::terminal::ConsoleSize;

// =============================================================================
// Deferred
// =============================================================================

type DeferredFn = dyn Fn(Option<ConsoleSize>) -> std::result::Result<TextValue, BoxError>;

/// Content computed at draw time.
///
/// The closure receives the terminal size, or `None` when it is unknown.
#[derive(Clone)]
pub struct Deferred(Rc<DeferredFn>);

impl Deferred {
    /// Wrap an infallible closure.
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn(Option<ConsoleSize>) -> T + 'static,
        T: Into<TextValue>,
    {
        Self(Rc::new(move |size: Option<ConsoleSize>| -> std::result::Result<TextValue, BoxError> {
            Ok(f(size).into())
        }))
    }

    /// Wrap a closure that can fail.
    ///
    /// Failures are not recovered: they surface as [`Error::Deferred`] from
    /// whatever triggered the draw.
    ///
    /// [`Error::Deferred`]: crate::Error::Deferred
    pub fn fallible<F, T, E>(f: F) -> Self
    where
        F: Fn(Option<ConsoleSize>) -> std::result::Result<T, E> + 'static,
        T: Into<TextValue>,
        E: Into<BoxError>,
    {
        Self(Rc::new(move |size: Option<ConsoleSize>| -> std::result::Result<TextValue, BoxError> {
            f(size).map(Into::into).map_err(Into::into)
        }))
    }

    /// Call the closure.
    pub fn evaluate(&self, size: Option<ConsoleSize>) -> std::result::Result<TextValue, BoxError> {
        (self.0)(size)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

// =============================================================================
// Text Item
// =============================================================================

/// Text of a [`TextItem::Detailed`] entry.
#[derive(Debug, Clone)]
pub enum DetailedText {
    Text(String),
    Deferred(Deferred),
}

/// One piece of declared content.
#[derive(Debug, Clone)]
pub enum TextItem {
    /// Plain text. Empty strings produce nothing.
    Literal(String),
    /// Evaluated on every draw.
    Deferred(Deferred),
    /// Text with a hanging indent; indents of nested items add up.
    Detailed { text: DetailedText, hanging_indent: u16 },
}

impl TextItem {
    pub fn deferred<F, T>(f: F) -> Self
    where
        F: Fn(Option<ConsoleSize>) -> T + 'static,
        T: Into<TextValue>,
    {
        TextItem::Deferred(Deferred::new(f))
    }

    /// Text whose wrapped continuation lines are indented by `hanging_indent`.
    pub fn hanging(text: impl Into<DetailedText>, hanging_indent: u16) -> Self {
        TextItem::Detailed {
            text: text.into(),
            hanging_indent,
        }
    }
}

impl From<&str> for TextItem {
    fn from(text: &str) -> Self {
        TextItem::Literal(text.to_string())
    }
}

impl From<String> for TextItem {
    fn from(text: String) -> Self {
        TextItem::Literal(text)
    }
}

impl From<Deferred> for TextItem {
    fn from(deferred: Deferred) -> Self {
        TextItem::Deferred(deferred)
    }
}

impl From<&str> for DetailedText {
    fn from(text: &str) -> Self {
        DetailedText::Text(text.to_string())
    }
}

impl From<String> for DetailedText {
    fn from(text: String) -> Self {
        DetailedText::Text(text)
    }
}

impl From<Deferred> for DetailedText {
    fn from(deferred: Deferred) -> Self {
        DetailedText::Deferred(deferred)
    }
}

/// Serialized form: `"text"` or `{ "text": "...", "indent": 2 }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SerializedTextItem {
    Text(String),
    HangingText { text: String, indent: Option<u16> },
}

impl From<SerializedTextItem> for TextItem {
    fn from(item: SerializedTextItem) -> Self {
        match item {
            SerializedTextItem::Text(text) => TextItem::Literal(text),
            SerializedTextItem::HangingText { text, indent } => {
                TextItem::hanging(text, indent.unwrap_or(0))
            }
        }
    }
}

impl<'de> Deserialize<'de> for TextItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        SerializedTextItem::deserialize(deserializer).map(TextItem::from)
    }
}

// =============================================================================
// Text Value
// =============================================================================

/// Input accepted by `set_text` / `log_above` and returned by deferred closures.
///
/// A bare string or closure is one item; a list keeps its order.
#[derive(Debug, Clone)]
pub enum TextValue {
    Item(TextItem),
    List(Vec<TextItem>),
}

impl TextValue {
    /// Normalize to a flat item list.
    pub fn into_items(self) -> Vec<TextItem> {
        match self {
            TextValue::Item(item) => vec![item],
            TextValue::List(items) => items,
        }
    }

    /// Decode a single item or an array of items from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Serialized {
            List(Vec<TextItem>),
            Item(TextItem),
        }

        Ok(match serde_json::from_str(json)? {
            Serialized::List(items) => TextValue::List(items),
            Serialized::Item(item) => TextValue::Item(item),
        })
    }
}

impl From<TextItem> for TextValue {
    fn from(item: TextItem) -> Self {
        TextValue::Item(item)
    }
}

impl From<Vec<TextItem>> for TextValue {
    fn from(items: Vec<TextItem>) -> Self {
        TextValue::List(items)
    }
}

impl From<&str> for TextValue {
    fn from(text: &str) -> Self {
        TextValue::Item(text.into())
    }
}

impl From<String> for TextValue {
    fn from(text: String) -> Self {
        TextValue::Item(text.into())
    }
}

impl From<Deferred> for TextValue {
    fn from(deferred: Deferred) -> Self {
        TextValue::Item(deferred.into())
    }
}

// =============================================================================
// Resolved Item
// =============================================================================

/// Flattened, render-ready text. Never empty once produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub text: String,
    pub hanging_indent: u16,
}

impl ResolvedItem {
    pub fn new(text: impl Into<String>, hanging_indent: u16) -> Self {
        Self {
            text: text.into(),
            hanging_indent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_value_normalizes() {
        assert_eq!(TextValue::from("one").into_items().len(), 1);
        assert!(TextValue::from(Vec::new()).into_items().is_empty());

        let items = TextValue::from(vec![TextItem::from("a"), TextItem::from("b")]).into_items();
        assert!(matches!(&items[1], TextItem::Literal(text) if text == "b"));
    }

    #[test]
    fn test_deferred_evaluates_each_call() {
        let deferred = Deferred::new(|size: Option<ConsoleSize>| match size {
            Some(size) => format!("{} cols", size.cols),
            None => "unknown".to_string(),
        });

        let value = deferred.evaluate(Some(ConsoleSize::new(42, 1))).unwrap();
        assert!(matches!(value, TextValue::Item(TextItem::Literal(text)) if text == "42 cols"));

        let value = deferred.evaluate(None).unwrap();
        assert!(matches!(value, TextValue::Item(TextItem::Literal(text)) if text == "unknown"));
    }

    #[test]
    fn test_fallible_deferred() {
        let deferred = Deferred::fallible(|_| -> std::result::Result<&str, &str> { Err("boom") });
        let err = deferred.evaluate(None).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_from_json_single_and_list() {
        let value = TextValue::from_json(r#""plain""#).unwrap();
        assert!(matches!(value, TextValue::Item(TextItem::Literal(text)) if text == "plain"));

        let json = r#"["a", { "text": "b", "indent": 3 }, { "text": "c" }]"#;
        let value = TextValue::from_json(json).unwrap();
        let items = value.into_items();
        assert_eq!(items.len(), 3);
        assert!(matches!(
            &items[1],
            TextItem::Detailed { text: DetailedText::Text(text), hanging_indent: 3 } if text == "b"
        ));
        assert!(matches!(&items[2], TextItem::Detailed { hanging_indent: 0, .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(TextValue::from_json("42").is_err());
    }

    #[test]
    fn test_resolved_item_serializes() {
        let json = serde_json::to_string(&ResolvedItem::new("x", 2)).unwrap();
        assert_eq!(json, r#"{"text":"x","hanging_indent":2}"#);
    }
}
