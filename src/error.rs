//! Error types for AuthFlow
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.
//!
//! Note that protocol-level failures of an authorization attempt (denial,
//! state mismatch, malformed responses) are not errors in this sense: they
//! are classified into [`AuthOutcome`](crate::auth::types::AuthOutcome)
//! variants and delivered through the attempt's outcome channel. The types
//! here cover failures that happen before an attempt is in flight
//! (configuration, launching) and transport-level failures that the token
//! exchanger folds into an outcome.

use thiserror::Error;

/// Main error type for AuthFlow operations
///
/// This enum encompasses all possible errors that can occur while
/// composing an authorization request, launching the redirect agent,
/// and talking to the token endpoint.
#[derive(Error, Debug)]
pub enum AuthFlowError {
    /// Configuration-related errors (missing or malformed static inputs).
    /// Raised before any network I/O and never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The redirect agent could not be started
    #[error("Redirect launch error: {0}")]
    Launch(String),

    /// The token endpoint answered with a non-success HTTP status
    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint {
        /// HTTP status code of the response
        status: u16,
        /// Response body, kept verbatim for diagnostics
        body: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for AuthFlow operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
