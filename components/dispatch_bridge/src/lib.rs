//! Dispatch bridge for native actions
//!
//! Intercepts cache lookups from a web view's network layer. Requests for the
//! reserved native-action address are decoded, handed to the installed host
//! handler, and answered with a synthesized JSON response. Everything else is
//! served by the wrapped cache unchanged.
//!
//! ```
//! use std::sync::Arc;
//! use bridge_types::{ActionError, NativeAction, ValueMap};
//! use dispatch_bridge::{BridgeCache, BridgeConfig, ResponseCache};
//! use handler_registry::ActionHandler;
//!
//! let bridge = BridgeCache::new(BridgeConfig::default()).unwrap();
//! let handler: Arc<dyn ActionHandler> = Arc::new(|action: &NativeAction| {
//!     let mut result = ValueMap::new();
//!     result.insert("echo".into(), action.name().into());
//!     Ok::<_, ActionError>(result)
//! });
//! bridge.set_handler(&handler);
//!
//! let request = http::Request::get("http://native.bridge/action/ping")
//!     .body(Vec::new())
//!     .unwrap();
//! let response = bridge.cached_response(&request).unwrap();
//! assert_eq!(response.body, br#"{"success":true,"result":{"echo":"ping"}}"#);
//! ```

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod memory_cache;
pub mod shared;

pub use bridge::{BridgeCache, NATIVE_ACTION_HEADER};
pub use cache::{CacheRequest, CachedResponse, ResponseCache, StoragePolicy};
pub use config::{BridgeConfig, BridgeConfigBuilder, DEFAULT_CACHE_CAPACITY};
pub use error::{BridgeError, Result};
pub use memory_cache::{CacheStats, MemoryCache};
pub use shared::{
    bridge_handler, clear_bridge_handler, install_bridge, set_bridge_handler, set_shared_cache,
    shared_cache,
};
