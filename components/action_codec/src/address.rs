//! Building action addresses
//!
//! The inverse of decoding: produces a URL that the classifier accepts and the
//! codec decodes back to the same name and parameters. Script code builds the
//! same shape with `encodeURIComponent(JSON.stringify(params))`.

use crate::decode::PARAMS_KEY;
use crate::EncodeError;
use bridge_types::ValueMap;
use request_classifier::ClassifierConfig;

/// Build the address for invoking `name` with `params`
///
/// Uses the first configured scheme (`http` if none is configured). Parameters
/// travel as a percent-encoded JSON object in the `params` query key and are
/// omitted entirely when empty.
pub fn action_url(
    config: &ClassifierConfig,
    name: &str,
    params: &ValueMap,
) -> Result<String, EncodeError> {
    let scheme = config.schemes.first().map(String::as_str).unwrap_or("http");

    let mut url = format!(
        "{}://{}/{}/{}",
        scheme,
        config.host,
        config.path_prefix,
        urlencoding::encode(name)
    );

    if !params.is_empty() {
        let json = serde_json::to_string(params)?;
        url.push('?');
        url.push_str(PARAMS_KEY);
        url.push('=');
        url.push_str(&urlencoding::encode(&json));
    }

    Ok(url)
}
