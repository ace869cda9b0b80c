// Native action descriptors, outcomes and the response wire shape
//
// This module is shared by every layer of the bridge: the codec produces
// NativeAction values, handlers return ActionResult values, and the codec
// turns those back into ActionResponse bodies.

pub mod errors;

pub use errors::{codes, ActionError, WireShapeError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// String-keyed JSON mapping used for action parameters and success payloads
pub type ValueMap = Map<String, Value>;

/// One intercepted native-action request
///
/// Immutable once built; the codec creates a fresh value per lookup and the
/// bridge drops it as soon as the handler returns.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeAction {
    id: Uuid,
    name: String,
    params: ValueMap,
    url: String,
}

impl NativeAction {
    /// Create a new action with a fresh invocation id
    pub fn new(name: impl Into<String>, params: ValueMap, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            params,
            url: url.into(),
        }
    }

    /// Invocation id, only meaningful for correlating log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Action name (e.g. "getVersion")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All named parameters
    pub fn params(&self) -> &ValueMap {
        &self.params
    }

    /// Full URL of the originating request
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw value of a single parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// String value of a parameter, `None` if absent or not a string
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    /// Deserialize a required parameter into `T`
    ///
    /// Missing or mistyped parameters yield an `InvalidParams` error that can be
    /// returned from a handler as-is.
    pub fn param_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ActionError> {
        let value = self
            .params
            .get(key)
            .ok_or_else(|| ActionError::invalid_params(format!("Missing '{}' parameter", key)))?;

        serde_json::from_value(value.clone()).map_err(|e| {
            ActionError::invalid_params(format!("Invalid '{}' parameter: {}", key, e))
        })
    }
}

/// Outcome of handling a native action
///
/// Exactly one of success payload or error is present.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Handler succeeded with a payload
    Success(ValueMap),
    /// Decode, dispatch or handler failure
    Failure(ActionError),
}

impl ActionResult {
    /// Whether this is a success outcome
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success(_))
    }

    /// Success payload, if any
    pub fn result(&self) -> Option<&ValueMap> {
        match self {
            ActionResult::Success(map) => Some(map),
            ActionResult::Failure(_) => None,
        }
    }

    /// Failure, if any
    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionResult::Success(_) => None,
            ActionResult::Failure(error) => Some(error),
        }
    }

    /// Convert into the wire shape
    pub fn to_response(&self) -> ActionResponse {
        match self {
            ActionResult::Success(map) => ActionResponse {
                success: true,
                result: Some(map.clone()),
                error: None,
                message: None,
                details: None,
            },
            ActionResult::Failure(error) => ActionResponse {
                success: false,
                result: None,
                error: Some(error.code.clone()),
                message: error.message.clone(),
                details: error.details.clone(),
            },
        }
    }
}

impl From<Result<ValueMap, ActionError>> for ActionResult {
    fn from(outcome: Result<ValueMap, ActionError>) -> Self {
        match outcome {
            Ok(map) => ActionResult::Success(map),
            Err(error) => ActionResult::Failure(error),
        }
    }
}

impl From<ActionError> for ActionResult {
    fn from(error: ActionError) -> Self {
        ActionResult::Failure(error)
    }
}

/// Response body as seen by script code
///
/// `{"success": true, "result": {...}}` on success,
/// `{"success": false, "error": "<code>", "message"?: ..., "details"?: ...}` on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    /// Top-level outcome flag
    pub success: bool,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ValueMap>,
    /// Error classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured error detail
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub details: Option<Value>,
}

/// A field that is present decodes as `Some`, even when it holds `null`
pub(crate) fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<ActionResponse> for ActionResult {
    type Error = WireShapeError;

    fn try_from(response: ActionResponse) -> Result<Self, Self::Error> {
        match (response.result, response.error) {
            (Some(_), Some(_)) => Err(WireShapeError::BothPresent),
            (None, None) => Err(WireShapeError::NeitherPresent),
            (Some(map), None) => {
                if !response.success {
                    return Err(WireShapeError::FlagMismatch {
                        flag: false,
                        payload: "result",
                    });
                }
                Ok(ActionResult::Success(map))
            }
            (None, Some(code)) => {
                if response.success {
                    return Err(WireShapeError::FlagMismatch {
                        flag: true,
                        payload: "error",
                    });
                }
                Ok(ActionResult::Failure(ActionError {
                    code,
                    message: response.message,
                    details: response.details,
                }))
            }
        }
    }
}
