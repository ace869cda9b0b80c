//! Integration tests for the dispatch bridge
//!
//! These tests drive the bridge through the cache surface only, the way the
//! network layer would.

use action_codec::action_url;
use async_trait::async_trait;
use bridge_types::{ActionError, NativeAction, ValueMap};
use dispatch_bridge::{
    BridgeCache, BridgeConfig, CacheRequest, CachedResponse, MemoryCache, ResponseCache,
    StoragePolicy,
};
use handler_registry::{ActionHandler, ActionRouter, AsyncActionHandler, BlockingHandler};
use http::{HeaderMap, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn get(url: &str) -> CacheRequest {
    Request::get(url).body(Vec::new()).expect("valid request")
}

fn post(url: &str, body: &str) -> CacheRequest {
    Request::post(url)
        .body(body.as_bytes().to_vec())
        .expect("valid request")
}

fn lookup(bridge: &BridgeCache, request: &CacheRequest) -> Value {
    let response = bridge
        .cached_response(request)
        .expect("native action lookups always produce a response");
    serde_json::from_slice(&response.body).expect("response body is JSON")
}

fn router() -> ActionRouter {
    ActionRouter::new()
        .with("getVersion", |_: &NativeAction| {
            let mut result = ValueMap::new();
            result.insert("version".to_string(), json!("1.2"));
            Ok::<_, ActionError>(result)
        })
        .with("add", |action: &NativeAction| {
            let a: i64 = action.param_as("a")?;
            let b: i64 = action.param_as("b")?;
            let mut result = ValueMap::new();
            result.insert("sum".to_string(), json!(a + b));
            Ok::<_, ActionError>(result)
        })
        .with("echo", |action: &NativeAction| {
            Ok::<_, ActionError>(action.params().clone())
        })
}

#[test]
fn test_get_version() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let body = lookup(&bridge, &get("http://native.bridge/action/getVersion"));
    assert_eq!(body, json!({"success": true, "result": {"version": "1.2"}}));
}

#[test]
fn test_missing_handler() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");

    let body = lookup(&bridge, &get("http://native.bridge/action/anything"));
    assert_eq!(body, json!({"success": false, "error": "NoHandlerRegistered"}));
}

#[test]
fn test_unknown_action_through_router() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let body = lookup(&bridge, &get("http://native.bridge/action/launchRockets"));
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UnknownAction");
    assert_eq!(body["details"]["action"], "launchRockets");
}

#[test]
fn test_params_from_query_and_body() {
    let config = BridgeConfig::default();
    let bridge = BridgeCache::new(config.clone()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let mut params = ValueMap::new();
    params.insert("a".to_string(), json!(2));
    params.insert("b".to_string(), json!(40));
    let url = action_url(config.classifier(), "add", &params).expect("Failed to build URL");
    assert_eq!(
        lookup(&bridge, &get(&url)),
        json!({"success": true, "result": {"sum": 42}})
    );

    let body = lookup(
        &bridge,
        &post("http://native.bridge/action/add", r#"{"a": 1, "b": 2}"#),
    );
    assert_eq!(body, json!({"success": true, "result": {"sum": 3}}));
}

#[test]
fn test_invalid_params_reported_by_handler() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let body = lookup(&bridge, &get("http://native.bridge/action/add?a=one&b=2"));
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "InvalidParams");
}

#[test]
fn test_nested_payload_survives() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let payload = json!({
        "user": {"name": "Zoë", "tags": ["a", "b"], "age": 31},
        "ratio": 0.25,
        "none": null,
        "ok": true
    });
    let body = lookup(
        &bridge,
        &post("http://native.bridge/action/echo", &payload.to_string()),
    );
    assert_eq!(body, json!({"success": true, "result": payload}));
}

#[test]
fn test_decode_failure_never_reaches_handler() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handler: Arc<dyn ActionHandler> = Arc::new(move |_: &NativeAction| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, ActionError>(ValueMap::new())
    });
    bridge.set_handler(&handler);

    let bad = [
        get("http://native.bridge/action/"),
        get("http://native.bridge/action/a%ZZ"),
        get("http://native.bridge/action/nested/path"),
        get("http://native.bridge/action/x?params=%7Bbroken"),
        get("http://native.bridge/action/x?params=%5B1%5D"),
        post("http://native.bridge/action/x", "not json"),
        post("http://native.bridge/action/x", "[1, 2]"),
    ];

    for request in &bad {
        let body = lookup(&bridge, request);
        assert_eq!(body["success"], false, "{}", request.uri());
        assert_eq!(body["error"], "DecodeError", "{}", request.uri());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_oversized_body_is_rejected() {
    let config = BridgeConfig::builder().max_body_size(16).build();
    let bridge = BridgeCache::new(config).expect("Failed to create bridge");

    let body = lookup(
        &bridge,
        &post(
            "http://native.bridge/action/x",
            r#"{"padding": "this is far too long"}"#,
        ),
    );
    assert_eq!(body["error"], "DecodeError");
    assert_eq!(body["details"]["reason"], "bodyTooLarge");
}

#[test]
fn test_ordinary_requests_pass_through() {
    let inner = Arc::new(MemoryCache::default());
    let bridge = BridgeCache::with_inner(BridgeConfig::default(), inner.clone())
        .expect("Failed to create bridge");
    let url = "https://example.com/page";

    assert_eq!(bridge.cached_response(&get(url)), inner.cached_response(&get(url)));
    assert!(bridge.cached_response(&get(url)).is_none());

    let stored = CachedResponse {
        url: url.to_string(),
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        body: b"<html>page</html>".to_vec(),
        storage_policy: StoragePolicy::Allowed,
    };
    bridge.store_cached_response(stored.clone(), &get(url));

    assert_eq!(bridge.cached_response(&get(url)), Some(stored.clone()));
    assert_eq!(inner.cached_response(&get(url)), Some(stored));
    assert_eq!(bridge.current_memory_usage(), inner.current_memory_usage());
    assert_eq!(bridge.memory_capacity(), inner.memory_capacity());

    bridge.remove_all_cached_responses();
    assert!(inner.is_empty());
}

#[test]
fn test_lookalike_addresses_pass_through() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    for url in [
        "http://native.bridge/other/getVersion",
        "http://native.bridge.evil.com/action/getVersion",
        "ftp://native.bridge/action/getVersion",
        "http://example.com/action/getVersion",
        "http://native.bridge/actions/getVersion",
    ] {
        assert!(bridge.cached_response(&get(url)).is_none(), "{}", url);
    }
}

#[test]
fn test_handler_swap_and_drop() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let url = "http://native.bridge/action/who";

    let first: Arc<dyn ActionHandler> = Arc::new(|_: &NativeAction| {
        let mut result = ValueMap::new();
        result.insert("handler".to_string(), json!("first"));
        Ok::<_, ActionError>(result)
    });
    let second: Arc<dyn ActionHandler> = Arc::new(|_: &NativeAction| {
        let mut result = ValueMap::new();
        result.insert("handler".to_string(), json!("second"));
        Ok::<_, ActionError>(result)
    });

    bridge.set_handler(&first);
    assert_eq!(lookup(&bridge, &get(url))["result"]["handler"], "first");

    bridge.set_handler(&second);
    assert_eq!(lookup(&bridge, &get(url))["result"]["handler"], "second");

    drop(second);
    assert_eq!(lookup(&bridge, &get(url))["error"], "NoHandlerRegistered");

    bridge.set_handler(&first);
    bridge.handlers().clear();
    assert_eq!(lookup(&bridge, &get(url))["error"], "NoHandlerRegistered");
}

#[test]
fn test_handler_sees_requests_in_order() {
    let bridge = BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge");
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let handler: Arc<dyn ActionHandler> = Arc::new(move |action: &NativeAction| {
        log.lock().push(action.name().to_string());
        Ok::<_, ActionError>(ValueMap::new())
    });
    bridge.set_handler(&handler);

    for name in ["one", "two", "three"] {
        let url = format!("http://native.bridge/action/{}", name);
        assert_eq!(lookup(&bridge, &get(&url))["success"], true);
    }

    assert_eq!(*seen.lock(), vec!["one", "two", "three"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups() {
    let bridge = Arc::new(BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge"));
    let handler: Arc<dyn ActionHandler> = Arc::new(router());
    bridge.set_handler(&handler);

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            tokio::task::spawn_blocking(move || {
                let url = format!("http://native.bridge/action/echo?n={}", i);
                let response = bridge.cached_response(&get(&url)).expect("response");
                let body: Value = serde_json::from_slice(&response.body).expect("JSON");
                (i, body)
            })
        })
        .collect();

    for task in tasks {
        let (i, body) = task.await.expect("lookup task panicked");
        // plain query pairs arrive as strings
        assert_eq!(body["result"]["n"], i.to_string(), "request {}", i);
    }
}

struct SlowVersion;

#[async_trait]
impl AsyncActionHandler for SlowVersion {
    async fn handle_action(&self, _action: &NativeAction) -> Result<ValueMap, ActionError> {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut result = ValueMap::new();
        result.insert("version".to_string(), json!("async"));
        Ok(result)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_handler_from_lookup_thread() {
    let bridge = Arc::new(BridgeCache::new(BridgeConfig::default()).expect("Failed to create bridge"));
    let handler: Arc<dyn ActionHandler> =
        Arc::new(BlockingHandler::on_current_runtime(SlowVersion).expect("inside a runtime"));
    bridge.set_handler(&handler);

    let lookup_bridge = Arc::clone(&bridge);
    let body = tokio::task::spawn_blocking(move || {
        lookup(&lookup_bridge, &get("http://native.bridge/action/getVersion"))
    })
    .await
    .expect("lookup task panicked");

    assert_eq!(body, json!({"success": true, "result": {"version": "async"}}));
}
