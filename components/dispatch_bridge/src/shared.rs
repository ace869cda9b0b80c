//! Process-wide shared cache
//!
//! The network layer consults one shared [`ResponseCache`]. By default that is
//! a plain [`MemoryCache`]; [`install_bridge`] replaces it with a
//! [`BridgeCache`] over the ordinary cache underneath.
//!
//! Handler accessors only act when the shared cache is a bridge. Against any
//! other cache, reads return `None` and writes are no-ops.

use crate::bridge::BridgeCache;
use crate::cache::ResponseCache;
use crate::config::BridgeConfig;
use crate::memory_cache::MemoryCache;
use crate::Result;
use handler_registry::ActionHandler;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

static SHARED_CACHE: Lazy<RwLock<Arc<dyn ResponseCache>>> =
    Lazy::new(|| RwLock::new(Arc::new(MemoryCache::default())));

/// The cache currently consulted by the network layer
pub fn shared_cache() -> Arc<dyn ResponseCache> {
    Arc::clone(&SHARED_CACHE.read())
}

/// Replace the shared cache
pub fn set_shared_cache(cache: Arc<dyn ResponseCache>) {
    *SHARED_CACHE.write() = cache;
}

/// The handler of the shared bridge
///
/// `None` if the shared cache is not a bridge or no live handler is installed.
pub fn bridge_handler() -> Option<Arc<dyn ActionHandler>> {
    shared_cache().handler_slot()?.current()
}

/// Install `handler` on the shared bridge
///
/// Does nothing if the shared cache is not a bridge. The bridge holds the
/// handler weakly, so the caller must keep its `Arc` alive.
pub fn set_bridge_handler(handler: &Arc<dyn ActionHandler>) {
    match shared_cache().handler_slot() {
        Some(slot) => slot.install(handler),
        None => debug!("Shared cache is not a native-action bridge; handler not installed"),
    }
}

/// Remove the handler from the shared bridge, if there is one
pub fn clear_bridge_handler() {
    if let Some(slot) = shared_cache().handler_slot() {
        slot.clear();
    }
}

/// Make a bridge the shared cache
///
/// The new bridge wraps the current shared cache, so previously stored
/// responses stay reachable. If the current cache is already a bridge, it is
/// replaced: the new one takes over its inner cache and handler slot, so an
/// installed handler stays active and only the new address convention is
/// intercepted.
pub fn install_bridge(config: BridgeConfig) -> Result<Arc<BridgeCache>> {
    let mut shared = SHARED_CACHE.write();
    let current = Arc::clone(&shared);

    let bridge = match current.handler_slot() {
        Some(slot) => {
            let inner = current.fallthrough().unwrap_or(current);
            debug!("Replacing installed native-action bridge");
            BridgeCache::with_slot(config, inner, slot)?
        }
        None => BridgeCache::with_inner(config, current)?,
    };
    let bridge = Arc::new(bridge);

    info!(
        "Installed native-action bridge on {}",
        bridge.classifier().config().host
    );
    *shared = Arc::clone(&bridge) as Arc<dyn ResponseCache>;
    Ok(bridge)
}
