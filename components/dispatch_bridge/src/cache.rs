//! The response-cache seam the web view's network layer talks to

use handler_registry::HandlerSlot;
use http::{HeaderMap, Request, Response, StatusCode};
use std::sync::Arc;

/// A request as presented to the cache: method, URI, headers and body bytes
pub type CacheRequest = Request<Vec<u8>>;

/// Whether and where a response may be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePolicy {
    /// May be stored
    Allowed,
    /// May be stored in memory only
    AllowedInMemoryOnly,
    /// Must not be stored
    NotAllowed,
}

/// A response held in, or synthesized by, a cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    /// URL the response answers
    pub url: String,
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
    /// Storage policy
    pub storage_policy: StoragePolicy,
}

impl CachedResponse {
    /// Wrap an HTTP response for `url`
    pub fn from_response(
        url: impl Into<String>,
        response: Response<Vec<u8>>,
        storage_policy: StoragePolicy,
    ) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            url: url.into(),
            status: parts.status,
            headers: parts.headers,
            body,
            storage_policy,
        }
    }

    /// Convert back into an HTTP response
    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Approximate memory cost used for capacity accounting
    pub fn cost(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.url.len() + headers + self.body.len()
    }
}

/// Response cache consulted by the network layer before going to the network
///
/// Mirrors the platform cache surface: lookup, store, remove, and usage
/// figures. Implementations are called on whatever thread performs the
/// lookup.
pub trait ResponseCache: Send + Sync {
    /// Cached (or synthesized) response for `request`, `None` if there is none
    fn cached_response(&self, request: &CacheRequest) -> Option<CachedResponse>;

    /// Offer a response received from the network for storage
    fn store_cached_response(&self, response: CachedResponse, request: &CacheRequest);

    /// Drop any stored response for `request`
    fn remove_cached_response(&self, request: &CacheRequest);

    /// Drop every stored response
    fn remove_all_cached_responses(&self);

    /// Bytes currently held
    fn current_memory_usage(&self) -> usize;

    /// Byte capacity
    fn memory_capacity(&self) -> usize;

    /// Handler slot of a native-action bridge
    ///
    /// Only bridge caches expose one; code holding an arbitrary cache uses
    /// this to decide whether it can install a handler at all.
    fn handler_slot(&self) -> Option<Arc<HandlerSlot>> {
        None
    }

    /// The cache this one hands ordinary requests to, if it wraps another
    fn fallthrough(&self) -> Option<Arc<dyn ResponseCache>> {
        None
    }
}
