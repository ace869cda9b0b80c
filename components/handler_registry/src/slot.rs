//! Non-owning, swappable reference to the active handler

use crate::ActionHandler;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Holds at most one handler, weakly
///
/// Reads and replacements are atomic with respect to each other. The owner
/// of the handler should call [`HandlerSlot::clear`] before tearing it down;
/// a handler dropped without clearing simply reads as absent.
#[derive(Default)]
pub struct HandlerSlot {
    handler: RwLock<Option<Weak<dyn ActionHandler>>>,
}

impl HandlerSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active handler
    pub fn install(&self, handler: &Arc<dyn ActionHandler>) {
        debug!("Installing native action handler");
        *self.handler.write() = Some(Arc::downgrade(handler));
    }

    /// The active handler, if one is installed and still alive
    ///
    /// The returned `Arc` should be held only for the duration of one dispatch.
    pub fn current(&self) -> Option<Arc<dyn ActionHandler>> {
        self.handler.read().as_ref().and_then(Weak::upgrade)
    }

    /// Remove the active handler
    pub fn clear(&self) {
        debug!("Clearing native action handler");
        *self.handler.write() = None;
    }

    /// Whether a live handler is installed
    pub fn is_installed(&self) -> bool {
        self.current().is_some()
    }
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}
