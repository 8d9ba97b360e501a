//! Authorization request construction
//!
//! Builds the immutable [`AuthorizationRequest`] record and the fully
//! qualified authorize URI it is launched with. The builder merges caller
//! parameters first and writes the provider-required parameters afterwards,
//! so `state`, `connection`, `client_id`, and `redirect_uri` can never be
//! displaced by caller input.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::auth::pkce::{self, PkcePair};
use crate::auth::types::{AgentKind, CorrelationId};
use crate::config::AccountConfig;
use crate::error::Result;

// ---------------------------------------------------------------------------
// AuthorizationRequest
// ---------------------------------------------------------------------------

/// One issued authorization request.
///
/// Created when a login is initiated, immutable afterwards, and consumed
/// exactly once when its redirect return is correlated. At most one request
/// is pending at any time; issuing a new one silently invalidates a stale
/// predecessor.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Opaque request code matched against the redirect return
    pub correlation_id: CorrelationId,

    /// Anti-CSRF state token embedded in the authorize URI
    pub state: String,

    /// Identity-provider connection the user authenticates against
    pub connection: String,

    /// Caller-supplied parameters, in their merge order
    pub parameters: BTreeMap<String, String>,

    /// Redirect URI the provider sends the user back to
    pub redirect_uri: String,

    /// PKCE pair when the code grant is in use; `None` for the implicit
    /// grant
    pub pkce: Option<PkcePair>,

    /// Redirect agent this request was launched with
    pub agent: AgentKind,

    /// When the request was issued; the attempt deadline counts from here
    pub issued_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Composes an [`AuthorizationRequest`] and its authorize URI.
///
/// The query is assembled in three layers:
///
/// 1. Defaults: `scope=openid`, `response_type=token`, and (when `use_pkce`
///    is set) the switch to `response_type=code` with the challenge pair.
/// 2. The caller's parameters, merged over the defaults.
/// 3. The reserved provider-required parameters: `state`, `connection`,
///    `client_id`, `redirect_uri`. These are written after the merge and
///    always reflect the generated/configured values.
///
/// # Errors
///
/// Returns [`AuthFlowError::Config`](crate::error::AuthFlowError::Config)
/// when the account's authorize URL is absent or malformed. No network I/O
/// happens here.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use authflow::auth::request::build_authorization_request;
/// use authflow::auth::types::AgentKind;
/// use authflow::config::AccountConfig;
///
/// let account = AccountConfig {
///     client_id: "client-123".to_string(),
///     authorize_url: Some("https://tenant.example.com/authorize".to_string()),
///     token_url: "https://tenant.example.com/oauth/token".to_string(),
/// };
///
/// let (request, uri) = build_authorization_request(
///     &account,
///     "google-oauth2",
///     &BTreeMap::new(),
///     "https://app.example.com/callback",
///     AgentKind::External,
///     true,
/// )
/// .unwrap();
///
/// assert!(request.pkce.is_some());
/// assert!(uri.as_str().contains("response_type=code"));
/// ```
pub fn build_authorization_request(
    account: &AccountConfig,
    connection: &str,
    caller_parameters: &BTreeMap<String, String>,
    redirect_uri: &str,
    agent: AgentKind,
    use_pkce: bool,
) -> Result<(AuthorizationRequest, Url)> {
    let mut uri = account.authorize_endpoint()?;

    let state = pkce::generate_state();
    let pair = use_pkce.then(pkce::generate_pair);

    // Layer 1: defaults. The implicit "token" grant unless PKCE is active.
    let mut query: BTreeMap<String, String> = BTreeMap::new();
    query.insert("scope".to_string(), "openid".to_string());
    query.insert("response_type".to_string(), "token".to_string());
    if let Some(ref pair) = pair {
        query.insert("response_type".to_string(), "code".to_string());
        query.insert("code_challenge".to_string(), pair.challenge.clone());
        query.insert("code_challenge_method".to_string(), pair.method.clone());
    }

    // Layer 2: caller parameters.
    for (key, value) in caller_parameters {
        query.insert(key.clone(), value.clone());
    }

    // Layer 3: reserved parameters, written after the merge.
    query.insert("state".to_string(), state.clone());
    query.insert("connection".to_string(), connection.to_string());
    query.insert("client_id".to_string(), account.client_id.clone());
    query.insert("redirect_uri".to_string(), redirect_uri.to_string());

    {
        let mut pairs = uri.query_pairs_mut();
        for (key, value) in &query {
            pairs.append_pair(key, value);
        }
    }

    let request = AuthorizationRequest {
        correlation_id: CorrelationId::new(),
        state,
        connection: connection.to_string(),
        parameters: caller_parameters.clone(),
        redirect_uri: redirect_uri.to_string(),
        pkce: pair,
        agent,
        issued_at: Utc::now(),
    };

    Ok((request, uri))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
