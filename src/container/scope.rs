//! Scope - one producer's slot in a container.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::{Container, ContainerInner};
use crate::error::Result;
use crate::terminal::ConsoleSize;
use crate::text::{TextItem, TextValue};

/// Registration handle through which one producer supplies text.
///
/// Created by [`Container::create_scope`]. Disposing (or dropping) the scope
/// removes its text from the block and redraws once.
pub struct Scope {
    id: u64,
    items: Rc<RefCell<Vec<TextItem>>>,
    container: Weak<ContainerInner>,
    disposed: Cell<bool>,
}

impl Scope {
    pub(crate) fn new(
        id: u64,
        items: Rc<RefCell<Vec<TextItem>>>,
        container: Weak<ContainerInner>,
    ) -> Self {
        Self {
            id,
            items,
            container,
            disposed: Cell::new(false),
        }
    }

    fn container(&self) -> Option<Container> {
        Container::upgrade(&self.container)
    }

    /// Replace this scope's items.
    ///
    /// Does not draw; the next refresh picks the new items up.
    pub fn set_text(&self, value: impl Into<TextValue>) {
        *self.items.borrow_mut() = value.into().into_items();
        if self.disposed.get() {
            return;
        }
        if let Some(container) = self.container() {
            container.notify_changed();
        }
    }

    /// Current items.
    pub fn items(&self) -> Vec<TextItem> {
        self.items.borrow().clone()
    }

    /// Same as [`Container::log_above`] on the owning container.
    pub fn log_above(&self, value: impl Into<TextValue>, size: Option<ConsoleSize>) -> Result<()> {
        match self.container() {
            Some(container) => container.log_above(value, size),
            None => Ok(()),
        }
    }

    /// Same as [`Container::refresh`] on the owning container.
    pub fn refresh(&self, size: Option<ConsoleSize>) -> Result<()> {
        match self.container() {
            Some(container) => container.refresh(size),
            None => Ok(()),
        }
    }

    /// Unregister and redraw once. Calling again does nothing.
    pub fn dispose(&self) -> Result<()> {
        if self.disposed.replace(true) {
            return Ok(());
        }
        let Some(container) = self.container() else {
            return Ok(());
        };
        if container.unregister_scope(self.id) {
            container.refresh(None)?;
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("items", &self.items.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!(scope = self.id, error = %err, "failed to refresh after dropping scope");
        }
    }
}
