//! Container - aggregates scopes and drives the render engine.
//!
//! A container owns the three collaborators (render engine, output sink, size
//! provider) and an ordered registration list of scopes. It never caches
//! content: every [`Container::refresh`] re-resolves all scope items, asks the
//! engine for the transcript and writes whatever comes back.
//!
//! # Example
//!
//! ```ignore
//! use static_text::Container;
//!
//! let container = Container::stderr();
//! let scope = container.create_scope();
//! scope.set_text("Downloading...");
//! container.refresh(None)?;
//!
//! container.log_above("finished step 1", None)?;
//! ```
//!
//! # Ownership
//!
//! Scopes own their items; the container only keeps weak references in
//! registration order. Dropping a [`Scope`] unregisters it.

pub mod scope;

pub use scope::Scope;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::engine::{RenderEngine, StaticText};
use crate::error::Result;
use crate::terminal::{ConsoleOutput, ConsoleSize, OutputSink, SizeProvider, TerminalSize};
use crate::text::{ResolvedItem, TextItem, TextValue, resolve_items};

/// Handle for a change subscription.
pub(crate) type SubscriberId = u64;

/// Registration of one live scope.
struct ScopeEntry {
    id: u64,
    items: Weak<RefCell<Vec<TextItem>>>,
}

struct Subscriber {
    id: SubscriberId,
    callback: Rc<dyn Fn()>,
}

pub(crate) struct ContainerInner {
    scopes: RefCell<Vec<ScopeEntry>>,
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
    engine: RefCell<Box<dyn RenderEngine>>,
    sink: Box<dyn OutputSink>,
    size_provider: Box<dyn SizeProvider>,
}

impl ContainerInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// Persistent text block at the bottom of the terminal.
///
/// Cloning is cheap and yields another handle to the same block.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    /// Create a container from its collaborators.
    pub fn new(
        engine: impl RenderEngine + 'static,
        sink: impl OutputSink + 'static,
        size_provider: impl SizeProvider + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                scopes: RefCell::new(Vec::new()),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                engine: RefCell::new(Box::new(engine)),
                sink: Box::new(sink),
                size_provider: Box::new(size_provider),
            }),
        }
    }

    /// Bundled engine on the configured stream, sized by the real terminal.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StaticText::new().keep_cursor_zero_column(config.keep_cursor_zero_column),
            ConsoleOutput::from(config.output),
            TerminalSize,
        )
    }

    /// Default configuration: draws on stderr.
    pub fn stderr() -> Self {
        Self::from_config(&Config::default())
    }

    pub(crate) fn upgrade(inner: &Weak<ContainerInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Register a new scope at the end of the list.
    pub fn create_scope(&self) -> Scope {
        let id = self.inner.next_id();
        let items = Rc::new(RefCell::new(Vec::new()));
        self.inner.scopes.borrow_mut().push(ScopeEntry {
            id,
            items: Rc::downgrade(&items),
        });
        debug!(scope = id, "scope registered");
        Scope::new(id, items, Rc::downgrade(&self.inner))
    }

    /// Number of registered scopes.
    pub fn scope_count(&self) -> usize {
        self.inner.scopes.borrow().len()
    }

    /// Remove a scope from the registration list. False if it was not registered.
    pub(crate) fn unregister_scope(&self, id: u64) -> bool {
        let mut scopes = self.inner.scopes.borrow_mut();
        let removed = scopes.iter().any(|entry| entry.id == id);
        scopes.retain(|entry| entry.id != id && entry.items.strong_count() > 0);
        if removed {
            debug!(scope = id, remaining = scopes.len(), "scope unregistered");
        }
        removed
    }

    /// Snapshot of every registered scope's items in registration order.
    ///
    /// Cloned so no borrow is held while deferred closures run.
    fn snapshot_items(&self) -> Vec<TextItem> {
        let mut items = Vec::new();
        for entry in self.inner.scopes.borrow().iter() {
            if let Some(scope_items) = entry.items.upgrade() {
                items.extend(scope_items.borrow().iter().cloned());
            }
        }
        items
    }

    // =========================================================================
    // Change Subscriptions
    // =========================================================================

    pub(crate) fn subscribe_changes(&self, callback: Rc<dyn Fn()>) -> SubscriberId {
        let id = self.inner.next_id();
        self.inner
            .subscribers
            .borrow_mut()
            .push(Subscriber { id, callback });
        id
    }

    pub(crate) fn unsubscribe_changes(&self, id: SubscriberId) {
        self.inner.subscribers.borrow_mut().retain(|s| s.id != id);
    }

    /// Tell subscribers that some scope's items changed.
    ///
    /// Callbacks may subscribe or unsubscribe; one removed during this
    /// notification is not called.
    pub(crate) fn notify_changed(&self) {
        let snapshot: Vec<(SubscriberId, Rc<dyn Fn()>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, s.callback.clone()))
            .collect();

        for (id, callback) in snapshot {
            let subscribed = self.inner.subscribers.borrow().iter().any(|s| s.id == id);
            if subscribed {
                callback();
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve every scope's items in registration order.
    pub fn resolved_items(&self, size: Option<ConsoleSize>) -> Result<Vec<ResolvedItem>> {
        let items = self.snapshot_items();
        resolve_items(&items, size).collect()
    }

    /// Whether at least one non-empty item resolves at the current size.
    ///
    /// Stops at the first item found.
    pub fn has_content(&self) -> Result<bool> {
        let items = self.snapshot_items();
        let first = resolve_items(&items, self.current_size()).next().transpose()?;
        Ok(first.is_some())
    }

    /// Current terminal size, or `None` when the provider fails.
    fn current_size(&self) -> Option<ConsoleSize> {
        match self.inner.size_provider.size() {
            Ok(size) => Some(size),
            Err(err) => {
                trace!(error = %err, "terminal size unavailable");
                None
            }
        }
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Redraw the block. `None` uses the current terminal size.
    pub fn refresh(&self, size: Option<ConsoleSize>) -> Result<()> {
        let size = size.or_else(|| self.current_size());
        self.refresh_sized(size)
    }

    fn refresh_sized(&self, size: Option<ConsoleSize>) -> Result<()> {
        let items = self.resolved_items(size)?;
        self.draw_frame(&ResolvedFrame { size, items })
    }

    /// Resolve once at the current size, for callers that decide before drawing.
    pub(crate) fn resolve_frame(&self) -> Result<ResolvedFrame> {
        let size = self.current_size();
        let items = self.resolved_items(size)?;
        Ok(ResolvedFrame { size, items })
    }

    /// Draw an already resolved frame; deferred items are not evaluated again.
    pub(crate) fn draw_frame(&self, frame: &ResolvedFrame) -> Result<()> {
        let text = self
            .inner
            .engine
            .borrow_mut()
            .render_text(&frame.items, frame.size);
        self.write(text)
    }

    /// Erase the block without replacing it.
    pub fn clear(&self, size: Option<ConsoleSize>) -> Result<()> {
        let size = size.or_else(|| self.current_size());
        self.clear_sized(size)
    }

    fn clear_sized(&self, size: Option<ConsoleSize>) -> Result<()> {
        let text = self.inner.engine.borrow_mut().clear_text(size);
        self.write(text)
    }

    /// Run `action` with the block erased, then draw it again.
    ///
    /// The block is restored on every exit path, including when `action`
    /// panics. The action's own return value, `Result` or not, is passed
    /// through untouched.
    pub fn with_temp_clear<R>(
        &self,
        size: Option<ConsoleSize>,
        action: impl FnOnce() -> R,
    ) -> Result<R> {
        let size = size.or_else(|| self.current_size());
        self.temp_clear_sized(size, action)
    }

    fn temp_clear_sized<R>(
        &self,
        size: Option<ConsoleSize>,
        action: impl FnOnce() -> R,
    ) -> Result<R> {
        let guard = RestoreGuard {
            container: self,
            size,
            armed: true,
        };
        self.clear_sized(size)?;
        let value = action();
        guard.finish()?;
        Ok(value)
    }

    /// Write text above the block. It is not kept for later redraws.
    pub fn log_above(&self, value: impl Into<TextValue>, size: Option<ConsoleSize>) -> Result<()> {
        let size = size.or_else(|| self.current_size());
        let items = value.into().into_items();
        let resolved = resolve_items(&items, size).collect::<Result<Vec<_>>>()?;

        self.temp_clear_sized(size, || {
            let text = self.inner.engine.borrow().render_once(&resolved, size);
            self.write(text.map(|text| format!("{text}\r\n")))
        })?
    }

    fn write(&self, text: Option<String>) -> Result<()> {
        match text {
            Some(text) if !text.is_empty() => Ok(self.inner.sink.write_text(&text)?),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scopes", &self.scope_count())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Items resolved for one draw, with the size they were resolved at.
pub(crate) struct ResolvedFrame {
    pub(crate) size: Option<ConsoleSize>,
    pub(crate) items: Vec<ResolvedItem>,
}

impl ResolvedFrame {
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Redraws the block when dropped unless [`RestoreGuard::finish`] ran.
struct RestoreGuard<'a> {
    container: &'a Container,
    size: Option<ConsoleSize>,
    armed: bool,
}

impl RestoreGuard<'_> {
    fn finish(mut self) -> Result<()> {
        self.armed = false;
        self.container.refresh_sized(self.size)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.container.refresh_sized(self.size) {
            warn!(error = %err, "failed to restore static text");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
