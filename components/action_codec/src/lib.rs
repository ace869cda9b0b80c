//! Native action codec
//!
//! Decodes classified requests into [`NativeAction`] values and encodes
//! [`ActionResult`] values into response bodies.
//!
//! # Wire format
//!
//! Request: `<scheme>://<host>/<prefix>/<actionName>?params=<percent-encoded JSON object>`,
//! optionally with a JSON object body whose keys override the query.
//!
//! Response (`application/json; charset=utf-8`):
//!
//! ```text
//! {"success": true,  "result": {...}}
//! {"success": false, "error": "<code>", "message": "...", "details": ...}
//! ```

pub mod address;
pub mod decode;
pub mod encode;
pub mod validation;

pub use address::action_url;
pub use decode::{DecodeError, PARAMS_KEY};
pub use encode::{
    decode_response, try_encode, EncodeError, EncodedResponse, ResponseError, FALLBACK_BODY,
};
pub use validation::{validate_action_name, DEFAULT_MAX_ACTION_NAME_LENGTH};

use bridge_types::{ActionResult, NativeAction};
use request_classifier::ActionRoute;
use serde::{Deserialize, Serialize};

/// Default maximum request body size (10MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Content type of every encoded response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Codec limits and response settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Maximum action name length
    pub max_action_name_length: usize,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Content type declared on encoded responses
    pub content_type: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_action_name_length: DEFAULT_MAX_ACTION_NAME_LENGTH,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }
}

/// Decoder/encoder for native-action traffic
#[derive(Debug, Clone, Default)]
pub struct ActionCodec {
    config: CodecConfig,
}

impl ActionCodec {
    /// Create a codec with the given limits
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Codec configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a classified request
    ///
    /// `body` may be empty; a non-empty body must be a JSON object.
    pub fn decode(&self, route: &ActionRoute, body: &[u8]) -> Result<NativeAction, DecodeError> {
        decode::decode_action(&self.config, route, body)
    }

    /// Encode an outcome into response bytes
    ///
    /// Always produces a body; see [`FALLBACK_BODY`].
    pub fn encode(&self, result: &ActionResult) -> EncodedResponse {
        EncodedResponse {
            content_type: self.config.content_type.clone(),
            body: encode::encode_result(result),
        }
    }
}
