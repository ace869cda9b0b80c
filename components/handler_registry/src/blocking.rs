//! Running async handlers behind the synchronous bridge

use crate::ActionHandler;
use async_trait::async_trait;
use bridge_types::{ActionError, NativeAction, ValueMap};
use tokio::runtime::Handle;
use tracing::debug;

/// Async counterpart of [`ActionHandler`]
#[async_trait]
pub trait AsyncActionHandler: Send + Sync {
    /// Execute `action`
    async fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError>;
}

/// Adapts an [`AsyncActionHandler`] to the synchronous [`ActionHandler`] contract
///
/// Each call blocks the calling thread on the given runtime until the future
/// completes. The lookup thread must not be one of that runtime's async worker
/// threads: `Handle::block_on` panics there, which the bridge reports as a
/// `HandlerError`. Blocking-pool threads (`spawn_blocking`) are fine.
pub struct BlockingHandler<H> {
    inner: H,
    runtime: Handle,
}

impl<H: AsyncActionHandler> BlockingHandler<H> {
    /// Wrap `inner`, driving it on `runtime`
    pub fn new(inner: H, runtime: Handle) -> Self {
        Self { inner, runtime }
    }

    /// Wrap `inner`, driving it on the runtime of the calling context
    ///
    /// Returns `None` outside a Tokio runtime.
    pub fn on_current_runtime(inner: H) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        Some(Self::new(inner, runtime))
    }
}

impl<H: AsyncActionHandler> ActionHandler for BlockingHandler<H> {
    fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError> {
        debug!(
            "Blocking on async handler for action '{}' ({})",
            action.name(),
            action.id()
        );
        self.runtime
            .block_on(AsyncActionHandler::handle_action(&self.inner, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowEcho;

    #[async_trait]
    impl AsyncActionHandler for SlowEcho {
        async fn handle_action(&self, action: &NativeAction) -> Result<ValueMap, ActionError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if action.name() == "fail" {
                return Err(ActionError::handler_error("async failure"));
            }
            let mut result = ValueMap::new();
            result.insert("echo".to_string(), json!(action.name()));
            Ok(result)
        }
    }

    #[test]
    fn test_blocks_until_async_handler_completes() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let handler = BlockingHandler::new(SlowEcho, runtime.handle().clone());

        let action = NativeAction::new("ping", ValueMap::new(), "u");
        let result = ActionHandler::handle_action(&handler, &action).unwrap();
        assert_eq!(result["echo"], "ping");

        let action = NativeAction::new("fail", ValueMap::new(), "u");
        let error = ActionHandler::handle_action(&handler, &action).unwrap_err();
        assert_eq!(error.message.as_deref(), Some("async failure"));
    }

    #[test]
    fn test_no_current_runtime() {
        assert!(BlockingHandler::on_current_runtime(SlowEcho).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_from_blocking_pool() {
        let handler = Arc::new(BlockingHandler::on_current_runtime(SlowEcho).unwrap());

        let result = tokio::task::spawn_blocking(move || {
            let action = NativeAction::new("pool", ValueMap::new(), "u");
            ActionHandler::handle_action(handler.as_ref(), &action)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(result["echo"], "pool");
    }
}
