//! Core types shared across the authorization flow
//!
//! Defines the identifiers, redirect payloads, credentials, and terminal
//! outcomes the flow's components exchange. Everything here is plain data;
//! the behaviour lives in the sibling modules.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CorrelationId
// ---------------------------------------------------------------------------

/// Opaque identifier correlating an asynchronous redirect return with the
/// authorization request that initiated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generates a new unique correlation id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AgentKind
// ---------------------------------------------------------------------------

/// The redirect agent an authorization request is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// The platform's system browser, reached through the generic
    /// open-URI capability. Its return arrives through the host's
    /// redirect entry point with no request code of its own.
    External,

    /// An in-process web surface opened by the host. Its completion signal
    /// carries the correlation id it was initialized with.
    Embedded,
}

// ---------------------------------------------------------------------------
// RedirectResult
// ---------------------------------------------------------------------------

/// The raw return of an external redirect, produced once per return and
/// consumed immediately by the flow's resume path.
#[derive(Debug, Clone)]
pub struct RedirectResult {
    /// Correlation id carried by the returning agent. `None` for returns
    /// arriving through the platform's generic redirect entry point, which
    /// carries no request code; those match whatever single request is
    /// pending.
    pub correlation_id: Option<CorrelationId>,

    /// Flat string-to-string parameter mapping taken from the redirect
    /// URI's fragment (implicit flow) or query string (code flow).
    /// Unknown keys are ignored, not errors.
    pub parameters: HashMap<String, String>,

    /// Which agent kind delivered this return
    pub arrived_via: AgentKind,
}

impl RedirectResult {
    /// Builds a `RedirectResult` from a redirect URI, reading parameters
    /// from the query string and, when present, the fragment. Fragment
    /// values win over query values of the same name, since the implicit
    /// grant returns its tokens in the fragment.
    ///
    /// # Examples
    ///
    /// ```
    /// use authflow::auth::types::{AgentKind, RedirectResult};
    /// use url::Url;
    ///
    /// let uri = Url::parse(
    ///     "https://app.example.com/callback#access_token=at&token_type=Bearer",
    /// )
    /// .unwrap();
    /// let result = RedirectResult::from_uri(&uri, AgentKind::External, None);
    /// assert_eq!(result.parameters.get("access_token").unwrap(), "at");
    /// ```
    pub fn from_uri(
        uri: &Url,
        arrived_via: AgentKind,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        let mut parameters: HashMap<String, String> = uri
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if let Some(fragment) = uri.fragment() {
            for (k, v) in url::form_urlencoded::parse(fragment.as_bytes()) {
                parameters.insert(k.into_owned(), v.into_owned());
            }
        }

        Self {
            correlation_id,
            parameters,
            arrived_via,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Token set produced by a successful authentication.
///
/// Values come either directly from the redirect parameters (implicit flow)
/// or from the token endpoint response (code flow with PKCE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OpenID Connect identity token, when granted
    pub id_token: Option<String>,

    /// Access token for API requests
    pub access_token: Option<String>,

    /// Token type, typically `"Bearer"`
    pub token_type: Option<String>,

    /// Refresh token, when granted
    pub refresh_token: Option<String>,
}

// ---------------------------------------------------------------------------
// AuthOutcome
// ---------------------------------------------------------------------------

/// Terminal outcome of one authorization attempt.
///
/// At most one outcome is ever delivered per issued request; a superseded
/// or duplicate redirect return is a no-op.
///
/// # Examples
///
/// ```
/// use authflow::auth::types::AuthOutcome;
///
/// let outcome = AuthOutcome::Denied;
/// assert!(!outcome.is_success());
/// assert!(outcome.credentials().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    /// The user authenticated and a token set was obtained
    Success(Credentials),

    /// The user cancelled at the identity provider or access was denied
    Denied,

    /// The returned `state` did not match the one recorded at issuance.
    /// This is an anti-CSRF failure and is never downgraded.
    StateMismatch,

    /// The return failed protocol validation for any other reason
    InvalidResponse {
        /// Raw detail kept for diagnostics
        detail: String,
    },

    /// The token exchange failed at the transport or HTTP level
    NetworkFailure {
        /// Underlying status or transport detail
        cause: String,
    },

    /// The attempt exceeded its overall deadline
    Timeout,

    /// The attempt was cancelled explicitly
    Cancelled,
}

impl AuthOutcome {
    /// Whether the attempt ended in a successful authentication
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    /// Extracts the credentials if the attempt succeeded
    pub fn credentials(self) -> Option<Credentials> {
        match self {
            AuthOutcome::Success(credentials) => Some(credentials),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
