//! Request decoding
//!
//! Turns a classified [`ActionRoute`] (plus optional body) into a [`NativeAction`].
//! Every input yields either an action or a [`DecodeError`]; nothing in here panics.

use crate::validation::validate_action_name;
use crate::CodecConfig;
use bridge_types::{ActionError, NativeAction, ValueMap};
use request_classifier::ActionRoute;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Query key whose value carries a percent-encoded JSON parameter object
pub const PARAMS_KEY: &str = "params";

/// Why a request that matched the reserved convention could not be decoded
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No action name in the address
    #[error("Action name is missing or empty")]
    EmptyActionName,

    /// Action name longer than the configured maximum
    #[error("Action name length {len} exceeds maximum of {max} characters")]
    ActionNameTooLong {
        /// Actual length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Action name has characters outside `[A-Za-z0-9_.:-]` or extra path segments
    #[error("Invalid action name: {0}")]
    InvalidActionName(String),

    /// A `%` not followed by two hex digits
    #[error("Invalid percent-encoding in {component} at byte {position}")]
    InvalidPercentEncoding {
        /// Which part of the request ("action name", "query", ...)
        component: &'static str,
        /// Byte offset of the offending `%`
        position: usize,
    },

    /// Percent-decoded bytes are not UTF-8
    #[error("Percent-decoded {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// The `params` query value is not valid JSON
    #[error("Malformed params: {0}")]
    MalformedParams(#[source] serde_json::Error),

    /// The request body is not valid JSON
    #[error("Malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// Parameters were valid JSON but not an object
    #[error("Parameters in {0} must be a JSON object")]
    ParamsNotObject(&'static str),

    /// Request body larger than the configured maximum
    #[error("Request body size {size} exceeds limit {max}")]
    BodyTooLarge {
        /// Actual body size
        size: usize,
        /// Configured maximum
        max: usize,
    },
}

impl DecodeError {
    /// Stable machine-readable tag, sent to script code as `details.reason`
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::EmptyActionName => "emptyActionName",
            DecodeError::ActionNameTooLong { .. } => "actionNameTooLong",
            DecodeError::InvalidActionName(_) => "invalidActionName",
            DecodeError::InvalidPercentEncoding { .. } => "invalidPercentEncoding",
            DecodeError::InvalidUtf8(_) => "invalidUtf8",
            DecodeError::MalformedParams(_) => "malformedParams",
            DecodeError::MalformedBody(_) => "malformedBody",
            DecodeError::ParamsNotObject(_) => "paramsNotObject",
            DecodeError::BodyTooLarge { .. } => "bodyTooLarge",
        }
    }
}

impl From<DecodeError> for ActionError {
    fn from(error: DecodeError) -> Self {
        ActionError::decode_error(error.to_string())
            .details(serde_json::json!({ "reason": error.reason() }))
    }
}

/// Decode a classified request into a native action
pub(crate) fn decode_action(
    config: &CodecConfig,
    route: &ActionRoute,
    body: &[u8],
) -> Result<NativeAction, DecodeError> {
    let name = decode_name(config, &route.target)?;

    let mut params = match route.query.as_deref() {
        Some(query) => decode_query(query)?,
        None => ValueMap::new(),
    };

    if !body.iter().all(u8::is_ascii_whitespace) {
        params.extend(decode_body(config, body)?);
    }

    debug!(
        "Decoded native action '{}' with {} params",
        name,
        params.len()
    );

    Ok(NativeAction::new(name, params, route.url.clone()))
}

fn decode_name(config: &CodecConfig, target: &str) -> Result<String, DecodeError> {
    if target.is_empty() {
        return Err(DecodeError::EmptyActionName);
    }
    if target.contains('/') {
        return Err(DecodeError::InvalidActionName(target.to_string()));
    }

    let name = percent_decode(target, "action name")?;
    validate_action_name(&name, config.max_action_name_length)?;
    Ok(name)
}

/// Decode `k=v&k2=v2` into parameters
///
/// Plain pairs become string parameters; a `params` pair must hold a JSON
/// object whose keys are merged over the plain pairs.
fn decode_query(query: &str) -> Result<ValueMap, DecodeError> {
    let mut params = ValueMap::new();
    let mut structured = None;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(raw_key, "query")?;
        let value = percent_decode(raw_value, "query")?;

        if key == PARAMS_KEY {
            let parsed: Value =
                serde_json::from_str(&value).map_err(DecodeError::MalformedParams)?;
            match parsed {
                Value::Object(map) => structured = Some(map),
                _ => return Err(DecodeError::ParamsNotObject("params query value")),
            }
        } else {
            params.insert(key, Value::String(value));
        }
    }

    if let Some(map) = structured {
        params.extend(map);
    }

    Ok(params)
}

fn decode_body(config: &CodecConfig, body: &[u8]) -> Result<ValueMap, DecodeError> {
    if body.len() > config.max_body_size {
        return Err(DecodeError::BodyTooLarge {
            size: body.len(),
            max: config.max_body_size,
        });
    }

    let parsed: Value = serde_json::from_slice(body).map_err(DecodeError::MalformedBody)?;
    match parsed {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::ParamsNotObject("request body")),
    }
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the result must be UTF-8. `+` is left as-is.
fn percent_decode(input: &str, component: &'static str) -> Result<String, DecodeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape_ok = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !escape_ok {
                return Err(DecodeError::InvalidPercentEncoding {
                    component,
                    position: i,
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| DecodeError::InvalidUtf8(component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(target: &str, query: Option<&str>) -> ActionRoute {
        ActionRoute {
            url: format!("http://native.bridge/action/{}", target),
            target: target.to_string(),
            query: query.map(str::to_string),
        }
    }

    fn decode(target: &str, query: Option<&str>, body: &[u8]) -> Result<NativeAction, DecodeError> {
        decode_action(&CodecConfig::default(), &route(target, query), body)
    }

    #[test]
    fn test_decode_name_only() {
        let action = decode("getVersion", None, b"").unwrap();
        assert_eq!(action.name(), "getVersion");
        assert!(action.params().is_empty());
    }

    #[test]
    fn test_decode_percent_encoded_name() {
        let action = decode("app%3Aopen", None, b"").unwrap();
        assert_eq!(action.name(), "app:open");
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(
            decode("", None, b""),
            Err(DecodeError::EmptyActionName)
        ));
    }

    #[test]
    fn test_extra_segments_rejected() {
        assert!(matches!(
            decode("a/b", None, b""),
            Err(DecodeError::InvalidActionName(_))
        ));
        assert!(matches!(
            decode("a%2Fb", None, b""),
            Err(DecodeError::InvalidActionName(_))
        ));
    }

    #[test]
    fn test_plain_query_pairs() {
        let action = decode("share", Some("text=a%26b&url=x%20y&flag"), b"").unwrap();
        assert_eq!(action.param("text"), Some(&json!("a&b")));
        assert_eq!(action.param("url"), Some(&json!("x y")));
        assert_eq!(action.param("flag"), Some(&json!("")));
    }

    #[test]
    fn test_plus_is_literal() {
        let action = decode("calc", Some("expr=1+2"), b"").unwrap();
        assert_eq!(action.param_str("expr"), Some("1+2"));
    }

    #[test]
    fn test_structured_params() {
        let action = decode(
            "save",
            Some("params=%7B%22n%22%3A1%2C%22tags%22%3A%5B%22a%22%5D%7D"),
            b"",
        )
        .unwrap();
        assert_eq!(action.param("n"), Some(&json!(1)));
        assert_eq!(action.param("tags"), Some(&json!(["a"])));
    }

    #[test]
    fn test_structured_params_override_plain_pairs() {
        let action = decode("save", Some("n=plain&params=%7B%22n%22%3A2%7D"), b"").unwrap();
        assert_eq!(action.param("n"), Some(&json!(2)));
    }

    #[test]
    fn test_body_overrides_query() {
        let action = decode("save", Some("n=1&m=keep"), br#"{"n": 2}"#).unwrap();
        assert_eq!(action.param("n"), Some(&json!(2)));
        assert_eq!(action.param("m"), Some(&json!("keep")));
    }

    #[test]
    fn test_whitespace_body_is_empty() {
        let action = decode("ping", None, b"  \n").unwrap();
        assert!(action.params().is_empty());
    }

    #[test]
    fn test_malformed_params() {
        assert!(matches!(
            decode("save", Some("params=%7Bnope"), b""),
            Err(DecodeError::MalformedParams(_))
        ));
        assert!(matches!(
            decode("save", Some("params=%5B1%5D"), b""),
            Err(DecodeError::ParamsNotObject(_))
        ));
        assert!(matches!(
            decode("save", None, b"[1, 2]"),
            Err(DecodeError::ParamsNotObject(_))
        ));
        assert!(matches!(
            decode("save", None, b"{oops"),
            Err(DecodeError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_bad_percent_escapes() {
        assert!(matches!(
            decode("get%zzVersion", None, b""),
            Err(DecodeError::InvalidPercentEncoding { position: 3, .. })
        ));
        assert!(matches!(
            decode("ping", Some("a=%4"), b""),
            Err(DecodeError::InvalidPercentEncoding { .. })
        ));
        assert!(matches!(
            decode("ping", Some("a=%FF%FE"), b""),
            Err(DecodeError::InvalidUtf8("query"))
        ));
    }

    #[test]
    fn test_body_too_large() {
        let config = CodecConfig {
            max_body_size: 4,
            ..CodecConfig::default()
        };
        let result = decode_action(&config, &route("ping", None), br#"{"a": 1}"#);
        assert!(matches!(
            result,
            Err(DecodeError::BodyTooLarge { size: 8, max: 4 })
        ));
    }

    #[test]
    fn test_decode_error_to_action_error() {
        let error: ActionError = DecodeError::EmptyActionName.into();
        assert_eq!(error.code, "DecodeError");
        assert_eq!(error.details, Some(json!({ "reason": "emptyActionName" })));
        assert!(error.message.is_some());
    }
}
