//! Error types for configuration and diagnosis
//!
//! ## Error Categories
//!
//! Only two kinds of failure are surfaced as `Err` values:
//!
//! - [`ConfigError`]: the deployment is misconfigured. Always fatal at setup;
//!   an unknown policy name is rejected rather than replaced by a default.
//! - [`DiagnosisError`]: the dependency graph could not be built, so there is
//!   nothing to reason about.
//!
//! Transport timeouts, malformed replies and outlier RMSE values are part of
//! normal operation and never appear here. They degrade into empty readings or
//! discarded metrics and are logged where they happen.

use thiserror::Error;

/// Result type for configuration loading and validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for diagnosis operations
pub type DiagnosisResult<T> = Result<T, DiagnosisError>;

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Control policy name is not one of the known policies
    #[error("unknown control policy `{name}` (expected one of: reactive, predictive)")]
    UnknownPolicy {
        /// The rejected name
        name: String,
    },

    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for the expected schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A setting is out of its valid range
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Failure to set up a diagnosis session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagnosisError {
    /// The topology extractor returned nothing (usually a timed-out request)
    #[error("topology extractor returned an empty dependency graph")]
    EmptyTopology,

    /// A component name does not map to a sensor, heater or controller
    #[error("component `{name}` is not a sensor (T*), heater (H*) or controller (C*)")]
    UnknownComponent {
        /// The unrecognised name
        name: String,
    },
}
