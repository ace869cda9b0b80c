//! Native actions for embedded web views
//!
//! Script code running in a web view reaches host functionality by issuing an
//! ordinary network request to a reserved address. The bridge installed here
//! sits in the network layer's response cache, recognizes those requests,
//! runs the registered host handler, and answers with a synthesized JSON
//! response. Every other request is left to the regular cache.
//!
//! # Example
//!
//! ```
//! use native_action_bridge::{
//!     ActionError, ActionRouter, BridgeConfig, NativeAction, NativeBridge, ResponseCache,
//!     ValueMap,
//! };
//!
//! let router = ActionRouter::new().with("getVersion", |_: &NativeAction| {
//!     let mut result = ValueMap::new();
//!     result.insert("version".into(), "1.2".into());
//!     Ok::<_, ActionError>(result)
//! });
//!
//! let bridge = NativeBridge::install(BridgeConfig::default(), router)?;
//!
//! let request = http::Request::get("http://native.bridge/action/getVersion")
//!     .body(Vec::new())
//!     .unwrap();
//! let response = native_action_bridge::shared_cache()
//!     .cached_response(&request)
//!     .unwrap();
//! assert_eq!(response.body, br#"{"success":true,"result":{"version":"1.2"}}"#);
//!
//! drop(bridge);
//! # Ok::<(), native_action_bridge::BridgeError>(())
//! ```

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub use action_codec::{
    action_url, decode_response, ActionCodec, CodecConfig, DecodeError, EncodedResponse,
};
pub use bridge_types::{codes, ActionError, ActionResponse, ActionResult, NativeAction, ValueMap};
pub use dispatch_bridge::{
    bridge_handler, clear_bridge_handler, set_bridge_handler, set_shared_cache, shared_cache,
    BridgeCache, BridgeConfig, BridgeConfigBuilder, BridgeError, CacheRequest, CacheStats,
    CachedResponse, MemoryCache, ResponseCache, Result, StoragePolicy,
};
pub use handler_registry::{
    ActionHandler, ActionRouter, AsyncActionHandler, BlockingHandler, HandlerSlot,
};
pub use request_classifier::{ActionRoute, ClassifierConfig, RequestClassifier};

/// Make a bridge the process-wide response cache
///
/// Wraps whatever cache is currently shared, so responses stored before the
/// call stay reachable. Calling it again layers a new bridge that keeps the
/// existing handler slot.
pub fn install(config: BridgeConfig) -> Result<Arc<BridgeCache>> {
    dispatch_bridge::install_bridge(config)
}

/// An installed bridge together with the handler it answers with
///
/// The bridge only holds its handler weakly. This handle keeps the handler
/// alive and clears it from the bridge when dropped.
pub struct NativeBridge {
    bridge: Arc<BridgeCache>,
    handler: Arc<dyn ActionHandler>,
}

impl NativeBridge {
    /// Install a bridge as the shared cache and register `handler` on it
    pub fn install<H>(config: BridgeConfig, handler: H) -> Result<Self>
    where
        H: ActionHandler + 'static,
    {
        let bridge = install(config)?;
        Ok(Self::attach(bridge, Arc::new(handler)))
    }

    /// Register `handler` on an existing bridge
    pub fn attach(bridge: Arc<BridgeCache>, handler: Arc<dyn ActionHandler>) -> Self {
        bridge.set_handler(&handler);
        Self { bridge, handler }
    }

    /// The bridge this handle registered on
    pub fn bridge(&self) -> &Arc<BridgeCache> {
        &self.bridge
    }

    /// The registered handler
    pub fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }
}

impl Drop for NativeBridge {
    fn drop(&mut self) {
        // leave a handler registered by someone else in place
        let ours = self
            .bridge
            .handler()
            .is_some_and(|current| Arc::ptr_eq(&current, &self.handler));
        if ours {
            debug!("Clearing native action handler");
            self.bridge.handlers().clear();
        }
    }
}

impl fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBridge")
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
