//! Host-side handlers and the swappable handler slot
//!
//! The bridge answers native actions through whatever [`ActionHandler`] is
//! currently installed in a [`HandlerSlot`]. The slot never owns the handler:
//! it holds a weak reference, so the handler lives exactly as long as the
//! code that installed it keeps it alive.
//!
//! ```
//! use std::sync::Arc;
//! use bridge_types::{ActionError, NativeAction, ValueMap};
//! use handler_registry::{ActionHandler, HandlerSlot};
//!
//! let slot = HandlerSlot::new();
//! let handler: Arc<dyn ActionHandler> =
//!     Arc::new(|_: &NativeAction| Ok::<_, ActionError>(ValueMap::new()));
//!
//! slot.install(&handler);
//! assert!(slot.current().is_some());
//!
//! drop(handler);
//! assert!(slot.current().is_none());
//! ```

pub mod blocking;
pub mod router;
pub mod slot;

pub use blocking::{AsyncActionHandler, BlockingHandler};
pub use router::ActionRouter;
pub use slot::HandlerSlot;

use bridge_types::{ActionError, NativeAction, ValueMap};

/// Host-side code that executes native actions
///
/// Called synchronously on the thread performing the cache lookup, which is
/// blocked until this returns. Long-running work belongs elsewhere.
pub trait ActionHandler: Send + Sync {
    /// Execute `action`, returning a success payload or an error for script code
    fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&NativeAction) -> Result<ValueMap, ActionError> + Send + Sync,
{
    fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError> {
        self(action)
    }
}
