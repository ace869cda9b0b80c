// Action error types
// Errors that cross the bridge back to script code, plus wire-shape violations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Well-known error classifications carried in the `error` field of a failure response.
///
/// Handlers are free to use their own codes; these are the ones the bridge itself produces.
pub mod codes {
    /// The request matched the reserved convention but could not be decoded
    pub const DECODE_ERROR: &str = "DecodeError";
    /// No handler was installed (or its owner dropped it) when the action arrived
    pub const NO_HANDLER_REGISTERED: &str = "NoHandlerRegistered";
    /// The handler failed without supplying a classification of its own
    pub const HANDLER_ERROR: &str = "HandlerError";
    /// A router received an action name it has no entry for
    pub const UNKNOWN_ACTION: &str = "UnknownAction";
    /// A parameter was missing or had the wrong type
    pub const INVALID_PARAMS: &str = "InvalidParams";
    /// The failure payload itself could not be serialized
    pub const ENCODING_FAILED: &str = "EncodingFailed";
}

/// Failure outcome of a native action
///
/// `code` is the classification script code switches on; `message` and `details`
/// are optional and only serialized when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionError {
    /// Error classification (e.g. "DecodeError", or any handler-defined code)
    pub code: String,
    /// Human-readable error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured error detail
    #[serde(
        default,
        deserialize_with = "crate::present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub details: Option<Value>,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for ActionError {}

impl ActionError {
    /// Create an error carrying only a classification
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            details: None,
        }
    }

    /// Create an error with a classification and message
    pub fn with_message(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            details: None,
        }
    }

    /// Create an error with a classification, message and structured details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            details: Some(details),
        }
    }

    /// Attach structured details to an existing error
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Decode failure for a request that matched the reserved convention
    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::with_message(codes::DECODE_ERROR, message)
    }

    /// No handler is available to answer the action
    ///
    /// Carries no message so the wire body stays exactly
    /// `{"success":false,"error":"NoHandlerRegistered"}`.
    pub fn no_handler_registered() -> Self {
        Self::new(codes::NO_HANDLER_REGISTERED)
    }

    /// Generic handler failure
    pub fn handler_error(message: impl Into<String>) -> Self {
        Self::with_message(codes::HANDLER_ERROR, message)
    }

    /// Action name not known to the handler
    pub fn unknown_action(action: impl Into<String>) -> Self {
        let action = action.into();
        Self::with_details(
            codes::UNKNOWN_ACTION,
            format!("Unknown action: {}", action),
            serde_json::json!({ "action": action }),
        )
    }

    /// Missing or mistyped parameter
    pub fn invalid_params(details: impl Into<String>) -> Self {
        let details = details.into();
        Self::with_details(
            codes::INVALID_PARAMS,
            "Invalid params",
            serde_json::json!({ "details": details }),
        )
    }

    /// Whether this error carries the given classification
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

/// A response body that does not follow the success/error wire shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireShapeError {
    /// Both `result` and `error` were present
    #[error("response carries both a result and an error")]
    BothPresent,

    /// Neither `result` nor `error` was present
    #[error("response carries neither a result nor an error")]
    NeitherPresent,

    /// The `success` flag contradicts the payload
    #[error("success flag is {flag} but payload is {payload}")]
    FlagMismatch {
        /// Value of the `success` flag
        flag: bool,
        /// Which payload was actually present
        payload: &'static str,
    },
}
