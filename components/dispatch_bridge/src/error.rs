//! Error types for the dispatch bridge

use thiserror::Error;

/// Errors raised while setting up a bridge
///
/// Lookups themselves never fail; every native-action problem is turned into
/// an error payload for script code instead.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configured header value cannot be sent
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
