//! Reserved-address matching for native-action requests
//!
//! A request is a native action when its URL uses one of the accepted schemes,
//! targets the reserved host, and its path sits under the reserved prefix:
//!
//! ```text
//! http://native.bridge/action/getVersion?params=%7B%7D
//! native-action://native.bridge/action/openSettings
//! ```
//!
//! Anything else, including addresses that fail to parse, is a silent
//! non-match and must be left to the normal cache.

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

/// Default reserved host
pub const DEFAULT_HOST: &str = "native.bridge";

/// Default reserved path prefix
pub const DEFAULT_PATH_PREFIX: &str = "action";

/// Dedicated scheme accepted in addition to http/https
pub const NATIVE_ACTION_SCHEME: &str = "native-action";

/// Reserved address convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Accepted URL schemes (compared case-insensitively)
    pub schemes: Vec<String>,
    /// Reserved host (compared case-insensitively)
    pub host: String,
    /// Reserved first path segment, without slashes
    pub path_prefix: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            schemes: vec![
                "http".to_string(),
                "https".to_string(),
                NATIVE_ACTION_SCHEME.to_string(),
            ],
            host: DEFAULT_HOST.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

/// Raw material of a matching request, handed to the codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRoute {
    /// Full request URL as parsed
    pub url: String,
    /// Path text after `/<prefix>/`, still percent-encoded (may be empty)
    pub target: String,
    /// Raw query string, still percent-encoded
    pub query: Option<String>,
}

/// Decides whether a request address is a native action
#[derive(Debug, Clone, Default)]
pub struct RequestClassifier {
    config: ClassifierConfig,
}

impl RequestClassifier {
    /// Create a classifier for the given convention
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// The convention this classifier matches
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether the address is a native-action request
    pub fn is_action(&self, url: &str) -> bool {
        self.classify(url).is_some()
    }

    /// Classify an address
    ///
    /// Returns `None` for every address that does not fully match the
    /// convention; this never fails.
    pub fn classify(&self, url: &str) -> Option<ActionRoute> {
        let parsed = Url::parse(url).ok()?;
        self.classify_url(&parsed)
    }

    /// Classify an already-parsed address
    pub fn classify_url(&self, url: &Url) -> Option<ActionRoute> {
        let scheme_ok = self
            .config
            .schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(url.scheme()));
        if !scheme_ok {
            return None;
        }

        let host = url.host_str()?;
        if !host.eq_ignore_ascii_case(&self.config.host) {
            return None;
        }

        let target = self.strip_prefix(url.path())?;

        trace!("Classified native action request: {}", url);

        Some(ActionRoute {
            url: url.as_str().to_string(),
            target: target.to_string(),
            query: url.query().map(str::to_string),
        })
    }

    /// Path remainder after `/<prefix>/`, or `None` if the path is not under the prefix
    fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_prefix(self.config.path_prefix.as_str())?;

        if rest.is_empty() {
            return Some("");
        }
        rest.strip_prefix('/')
    }
}
