//! Name-based routing to per-action handlers

use crate::ActionHandler;
use bridge_types::{ActionError, NativeAction, ValueMap};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler that dispatches on the action name
///
/// Owns its routes; install the router itself in a [`crate::HandlerSlot`].
#[derive(Default)]
pub struct ActionRouter {
    routes: DashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one action name, replacing any previous one
    pub fn register<H>(&self, action: impl Into<String>, handler: H)
    where
        H: ActionHandler + 'static,
    {
        let action = action.into();
        debug!("Registering action route: {}", action);
        self.routes.insert(action, Arc::new(handler));
    }

    /// Builder-style variant of [`ActionRouter::register`]
    pub fn with<H>(self, action: impl Into<String>, handler: H) -> Self
    where
        H: ActionHandler + 'static,
    {
        self.register(action, handler);
        self
    }

    /// Remove the handler for an action name
    pub fn unregister(&self, action: &str) -> Option<Arc<dyn ActionHandler>> {
        debug!("Unregistering action route: {}", action);
        self.routes.remove(action).map(|(_, v)| v)
    }

    /// Whether a route exists for the action name
    pub fn contains(&self, action: &str) -> bool {
        self.routes.contains_key(action)
    }

    /// Registered action names, sorted
    pub fn actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl ActionHandler for ActionRouter {
    fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError> {
        // Clone out of the map so the shard lock is released before the call;
        // route handlers may register or unregister routes.
        let handler = self
            .routes
            .get(action.name())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                warn!("No route for action: {}", action.name());
                ActionError::unknown_action(action.name())
            })?;

        handler.handle_action(action)
    }
}
