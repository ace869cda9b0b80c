//! Response encoding
//!
//! Success and failure both serialize to the `ActionResponse` shape. Encoding
//! never gives up: a success payload that fails to serialize is reported as an
//! `EncodingFailed` error, and if even that fails the fixed
//! [`FALLBACK_BODY`] is returned.

use bridge_types::{codes, ActionError, ActionResponse, ActionResult, WireShapeError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Minimal error body used when no payload can be serialized at all
pub const FALLBACK_BODY: &[u8] = br#"{"success":false,"error":"EncodingFailed"}"#;

/// Response bytes plus their declared content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    /// Value for the Content-Type header
    pub content_type: String,
    /// Serialized `ActionResponse`
    pub body: Vec<u8>,
}

/// Serialization failure while encoding a result
#[derive(Error, Debug)]
pub enum EncodeError {
    /// serde_json rejected the payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reading a response body back into an `ActionResult`
#[derive(Error, Debug)]
pub enum ResponseError {
    /// Body is not valid JSON / not an object with a `success` flag
    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Body is JSON but violates the success/error shape
    #[error("Invalid response shape: {0}")]
    Shape(#[from] WireShapeError),
}

/// Serialize an outcome, degrading instead of failing
pub(crate) fn encode_result(result: &ActionResult) -> Vec<u8> {
    match try_encode(result) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize action result: {}", e);
            let failure = ActionResult::Failure(ActionError::with_message(
                codes::ENCODING_FAILED,
                "Failed to serialize action result",
            ));
            serialize_or_fallback(&failure.to_response())
        }
    }
}

/// Serialize an outcome, reporting serialization errors
pub fn try_encode(result: &ActionResult) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&result.to_response())?)
}

fn serialize_or_fallback<T: Serialize>(response: &T) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|e| {
        error!("Failed to serialize error response: {}", e);
        FALLBACK_BODY.to_vec()
    })
}

/// Parse a response body back into an outcome
pub fn decode_response(body: &[u8]) -> Result<ActionResult, ResponseError> {
    let response: ActionResponse = serde_json::from_slice(body)?;
    Ok(ActionResult::try_from(response)?)
}
