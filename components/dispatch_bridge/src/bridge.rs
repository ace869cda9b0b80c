//! The substituted response cache
//!
//! [`BridgeCache`] sits where the network layer expects its response cache.
//! Ordinary lookups go straight to the wrapped cache. Lookups for the
//! reserved native-action address are answered on the spot:
//!
//! 1. decode the request (failure → `DecodeError` payload, handler not called)
//! 2. take the current handler (none → `NoHandlerRegistered` payload)
//! 3. run the handler synchronously on the calling thread
//! 4. encode the outcome into a synthesized `200` response
//!
//! Every native-action lookup produces exactly one response and none of them
//! reach the wrapped cache or the network.

use crate::cache::{CacheRequest, CachedResponse, ResponseCache, StoragePolicy};
use crate::config::BridgeConfig;
use crate::memory_cache::MemoryCache;
use crate::Result;
use action_codec::{ActionCodec, JSON_CONTENT_TYPE};
use bridge_types::{ActionError, ActionResult, NativeAction};
use handler_registry::{ActionHandler, HandlerSlot};
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use request_classifier::{ActionRoute, RequestClassifier};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Header naming the dispatched action on synthesized responses
pub const NATIVE_ACTION_HEADER: &str = "x-native-action";

/// Response cache that answers native-action requests itself
pub struct BridgeCache {
    classifier: RequestClassifier,
    codec: ActionCodec,
    handlers: Arc<HandlerSlot>,
    inner: Arc<dyn ResponseCache>,
}

impl BridgeCache {
    /// Create a bridge over a fresh [`MemoryCache`] with its own handler slot
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let inner = Arc::new(MemoryCache::new(config.cache_capacity()));
        Self::with_inner(config, inner)
    }

    /// Create a bridge over an existing cache
    pub fn with_inner(config: BridgeConfig, inner: Arc<dyn ResponseCache>) -> Result<Self> {
        Self::with_slot(config, inner, Arc::new(HandlerSlot::new()))
    }

    /// Create a bridge over an existing cache, reading handlers from `handlers`
    ///
    /// Sharing a slot lets the owner of the handler install and clear it
    /// without going through the bridge or any process-wide state.
    pub fn with_slot(
        config: BridgeConfig,
        inner: Arc<dyn ResponseCache>,
        handlers: Arc<HandlerSlot>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: RequestClassifier::new(config.classifier().clone()),
            codec: ActionCodec::new(config.codec().clone()),
            handlers,
            inner,
        })
    }

    /// The handler slot this bridge reads from
    pub fn handlers(&self) -> &Arc<HandlerSlot> {
        &self.handlers
    }

    /// Replace the active handler
    pub fn set_handler(&self, handler: &Arc<dyn ActionHandler>) {
        self.handlers.install(handler);
    }

    /// The active handler, if any
    pub fn handler(&self) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.current()
    }

    /// The cache ordinary requests fall through to
    pub fn inner(&self) -> &Arc<dyn ResponseCache> {
        &self.inner
    }

    /// The classifier deciding which requests are native actions
    pub fn classifier(&self) -> &RequestClassifier {
        &self.classifier
    }

    /// Whether `request` targets the reserved native-action address
    pub fn is_native_action(&self, request: &CacheRequest) -> bool {
        self.classifier.is_action(&request.uri().to_string())
    }

    /// Decode and run one classified request, returning its outcome
    pub fn dispatch(&self, route: &ActionRoute, body: &[u8]) -> ActionResult {
        self.run(route, body).1
    }

    fn run(&self, route: &ActionRoute, body: &[u8]) -> (Option<String>, ActionResult) {
        let action = match self.codec.decode(route, body) {
            Ok(action) => action,
            Err(e) => {
                warn!("Failed to decode native action {}: {}", route.url, e);
                return (None, ActionResult::Failure(e.into()));
            }
        };

        let name = action.name().to_string();

        let Some(handler) = self.handlers.current() else {
            warn!("No handler registered for native action: {}", name);
            return (
                Some(name),
                ActionResult::Failure(ActionError::no_handler_registered()),
            );
        };

        debug!("Dispatching native action '{}' ({})", name, action.id());
        let result = invoke(handler.as_ref(), &action);
        if let ActionResult::Failure(error) = &result {
            debug!("Native action '{}' failed: {}", name, error);
        }

        (Some(name), result)
    }

    fn synthesize(&self, url: &str, action: Option<&str>, result: &ActionResult) -> CachedResponse {
        let encoded = self.codec.encode(result);

        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&encoded.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(encoded.body.len()));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        if let Some(value) = action.and_then(|name| HeaderValue::from_str(name).ok()) {
            headers.insert(HeaderName::from_static(NATIVE_ACTION_HEADER), value);
        }

        CachedResponse {
            url: url.to_string(),
            status: StatusCode::OK,
            headers,
            body: encoded.body,
            storage_policy: StoragePolicy::NotAllowed,
        }
    }
}

/// Run the handler, turning a panic into a `HandlerError`
fn invoke(handler: &dyn ActionHandler, action: &NativeAction) -> ActionResult {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle_action(action))) {
        Ok(outcome) => outcome.into(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                "Handler panicked on native action '{}': {}",
                action.name(),
                message
            );
            ActionResult::Failure(ActionError::handler_error(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl ResponseCache for BridgeCache {
    fn cached_response(&self, request: &CacheRequest) -> Option<CachedResponse> {
        let url = request.uri().to_string();

        let Some(route) = self.classifier.classify(&url) else {
            trace!("Passing through cache lookup: {}", url);
            return self.inner.cached_response(request);
        };

        let (action, result) = self.run(&route, request.body());
        Some(self.synthesize(&route.url, action.as_deref(), &result))
    }

    fn store_cached_response(&self, response: CachedResponse, request: &CacheRequest) {
        if self.is_native_action(request) {
            trace!("Not storing native action response: {}", request.uri());
            return;
        }
        self.inner.store_cached_response(response, request);
    }

    fn remove_cached_response(&self, request: &CacheRequest) {
        if self.is_native_action(request) {
            return;
        }
        self.inner.remove_cached_response(request);
    }

    fn remove_all_cached_responses(&self) {
        self.inner.remove_all_cached_responses();
    }

    fn current_memory_usage(&self) -> usize {
        self.inner.current_memory_usage()
    }

    fn memory_capacity(&self) -> usize {
        self.inner.memory_capacity()
    }

    fn handler_slot(&self) -> Option<Arc<HandlerSlot>> {
        Some(Arc::clone(&self.handlers))
    }

    fn fallthrough(&self) -> Option<Arc<dyn ResponseCache>> {
        Some(Arc::clone(&self.inner))
    }
}

impl fmt::Debug for BridgeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeCache")
            .field("classifier", self.classifier.config())
            .field("codec", self.codec.config())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
