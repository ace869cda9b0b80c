//! Configuration for the dispatch bridge

use crate::{BridgeError, Result};
use action_codec::CodecConfig;
use http::HeaderValue;
use request_classifier::ClassifierConfig;
use serde::{Deserialize, Serialize};

/// Default capacity of the in-memory cache behind the bridge (4 MB)
pub const DEFAULT_CACHE_CAPACITY: usize = 4 * 1024 * 1024;

/// Configuration for a [`crate::BridgeCache`]
///
/// Combines the reserved address convention, codec limits and the capacity of
/// the default cache that ordinary requests fall through to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Reserved address convention
    classifier: ClassifierConfig,

    /// Codec limits and response content type
    codec: CodecConfig,

    /// Byte capacity of the default in-memory cache
    cache_capacity: usize,
}

impl BridgeConfig {
    /// Create a new builder for BridgeConfig
    ///
    /// # Example
    ///
    /// ```
    /// use dispatch_bridge::BridgeConfig;
    ///
    /// let config = BridgeConfig::builder()
    ///     .host("bridge.local")
    ///     .path_prefix("native")
    ///     .build();
    ///
    /// assert_eq!(config.classifier().host, "bridge.local");
    /// ```
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Get the reserved address convention
    pub fn classifier(&self) -> &ClassifierConfig {
        &self.classifier
    }

    /// Get the codec settings
    pub fn codec(&self) -> &CodecConfig {
        &self.codec
    }

    /// Get the default cache capacity
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Check that the configuration can drive a bridge
    pub fn validate(&self) -> Result<()> {
        if self.classifier.host.is_empty() {
            return Err(BridgeError::InvalidConfiguration(
                "reserved host must not be empty".to_string(),
            ));
        }
        if self.classifier.schemes.is_empty() {
            return Err(BridgeError::InvalidConfiguration(
                "at least one scheme is required".to_string(),
            ));
        }
        if self.classifier.path_prefix.is_empty() || self.classifier.path_prefix.contains('/') {
            return Err(BridgeError::InvalidConfiguration(format!(
                "path prefix must be a single non-empty segment, got '{}'",
                self.classifier.path_prefix
            )));
        }
        if self.codec.max_action_name_length == 0 || self.codec.max_body_size == 0 {
            return Err(BridgeError::InvalidConfiguration(
                "codec limits must be greater than zero".to_string(),
            ));
        }
        HeaderValue::from_str(&self.codec.content_type)?;
        Ok(())
    }
}

impl Default for BridgeConfig {
    /// Create a default configuration
    ///
    /// Default values:
    /// - schemes: http, https, native-action
    /// - host: native.bridge
    /// - path_prefix: action
    /// - max_action_name_length: 256
    /// - max_body_size: 10 MB
    /// - content_type: application/json; charset=utf-8
    /// - cache_capacity: 4 MB
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            codec: CodecConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Builder for BridgeConfig
///
/// Provides a fluent interface for constructing BridgeConfig instances.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    schemes: Vec<String>,
    host: Option<String>,
    path_prefix: Option<String>,
    max_action_name_length: Option<usize>,
    max_body_size: Option<usize>,
    content_type: Option<String>,
    cache_capacity: Option<usize>,
}

impl BridgeConfigBuilder {
    /// Accept a URL scheme
    ///
    /// The first call replaces the default scheme list.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    /// Set the reserved host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the reserved path prefix (a single segment, without slashes)
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Set maximum action name length
    pub fn max_action_name_length(mut self, length: usize) -> Self {
        self.max_action_name_length = Some(length);
        self
    }

    /// Set maximum request body size in bytes
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = Some(size);
        self
    }

    /// Set the content type declared on synthesized responses
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the default cache capacity in bytes
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Build the BridgeConfig
    ///
    /// Uses default values for any options not explicitly set.
    pub fn build(self) -> BridgeConfig {
        let default = BridgeConfig::default();

        let mut schemes = default.classifier.schemes;
        if !self.schemes.is_empty() {
            schemes = self.schemes;
        }

        BridgeConfig {
            classifier: ClassifierConfig {
                schemes,
                host: self.host.unwrap_or(default.classifier.host),
                path_prefix: self.path_prefix.unwrap_or(default.classifier.path_prefix),
            },
            codec: CodecConfig {
                max_action_name_length: self
                    .max_action_name_length
                    .unwrap_or(default.codec.max_action_name_length),
                max_body_size: self.max_body_size.unwrap_or(default.codec.max_body_size),
                content_type: self.content_type.unwrap_or(default.codec.content_type),
            },
            cache_capacity: self.cache_capacity.unwrap_or(default.cache_capacity),
        }
    }
}
