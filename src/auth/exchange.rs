//! Token endpoint clients
//!
//! Two ways credentials come back over the wire: the PKCE code exchange
//! performed after a successful redirect return ([`TokenEndpoint`] /
//! [`HttpTokenEndpoint`]), and the direct resource-owner-credentials login
//! that bypasses the redirect machinery entirely ([`DatabaseClient`]).
//!
//! Neither path retries: a failed exchange is terminal for its attempt.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::types::{AuthOutcome, Credentials};
use crate::config::AccountConfig;
use crate::error::{AuthFlowError, Result};

// ---------------------------------------------------------------------------
// Token endpoint response (raw deserialization)
// ---------------------------------------------------------------------------

/// Raw JSON response from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_credentials(self) -> Credentials {
        Credentials {
            id_token: self.id_token,
            access_token: Some(self.access_token),
            token_type: self.token_type,
            refresh_token: self.refresh_token,
        }
    }
}

// ---------------------------------------------------------------------------
// TokenEndpoint
// ---------------------------------------------------------------------------

/// Network capability that turns an authorization code into credentials.
///
/// The flow depends on this trait rather than a concrete client so tests
/// and embedders can substitute their own transport.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges an authorization code plus PKCE verifier for credentials.
    ///
    /// `redirect_uri` must be the exact value used to obtain the code.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-success HTTP status. The caller folds
    /// the error into a `NetworkFailure` outcome; implementations must not
    /// retry.
    async fn exchange(&self, code: &str, verifier: &str, redirect_uri: &str)
        -> Result<Credentials>;
}

// ---------------------------------------------------------------------------
// HttpTokenEndpoint
// ---------------------------------------------------------------------------

/// [`TokenEndpoint`] implementation over a shared `reqwest` client.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use authflow::auth::exchange::HttpTokenEndpoint;
/// use authflow::config::AccountConfig;
///
/// let account = AccountConfig {
///     client_id: "client-123".to_string(),
///     authorize_url: Some("https://tenant.example.com/authorize".to_string()),
///     token_url: "https://tenant.example.com/oauth/token".to_string(),
/// };
/// let endpoint = HttpTokenEndpoint::new(Arc::new(reqwest::Client::new()), account);
/// ```
pub struct HttpTokenEndpoint {
    http: Arc<reqwest::Client>,
    account: AccountConfig,
}

impl HttpTokenEndpoint {
    /// Creates a token endpoint client for the given account.
    pub fn new(http: Arc<reqwest::Client>, account: AccountConfig) -> Self {
        Self { http, account }
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<Credentials> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", &self.account.client_id);
        params.insert("code_verifier", verifier);

        tracing::debug!(token_url = %self.account.token_url, "exchanging authorization code");

        let resp = self
            .http
            .post(&self.account.token_url)
            .form(&params)
            .send()
            .await
            .map_err(AuthFlowError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status, "token endpoint rejected the exchange");
            return Err(AuthFlowError::TokenEndpoint { status, body }.into());
        }

        let raw: TokenResponse = resp.json().await.map_err(AuthFlowError::Http)?;
        Ok(raw.into_credentials())
    }
}

// ---------------------------------------------------------------------------
// DatabaseClient
// ---------------------------------------------------------------------------

/// Direct-credentials login against the provider's resource-owner endpoint.
///
/// Shares the terminal [`AuthOutcome`] contract with the redirect flow but
/// never touches the redirect machinery: one POST, one outcome.
pub struct DatabaseClient {
    http: Arc<reqwest::Client>,
    account: AccountConfig,
}

impl DatabaseClient {
    /// Creates a direct-login client for the given account.
    pub fn new(http: Arc<reqwest::Client>, account: AccountConfig) -> Self {
        Self { http, account }
    }

    /// Authenticates with a username/password pair against a connection.
    ///
    /// A `401` or `403` from the endpoint means the credentials were
    /// rejected and classifies as [`AuthOutcome::Denied`]; any other
    /// failure is a [`AuthOutcome::NetworkFailure`] with the underlying
    /// detail preserved.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        connection: &str,
    ) -> AuthOutcome {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "password");
        params.insert("username", username);
        params.insert("password", password);
        params.insert("connection", connection);
        params.insert("client_id", &self.account.client_id);
        params.insert("scope", "openid");

        let resp = match self
            .http
            .post(&self.account.token_url)
            .form(&params)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                return AuthOutcome::NetworkFailure {
                    cause: format!("login request failed: {e}"),
                }
            }
        };

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            tracing::debug!(connection, "login rejected by credentials endpoint");
            return AuthOutcome::Denied;
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return AuthOutcome::NetworkFailure {
                cause: format!("login endpoint returned {status}: {body}"),
            };
        }

        match resp.json::<TokenResponse>().await {
            Ok(raw) => AuthOutcome::Success(raw.into_credentials()),
            Err(e) => AuthOutcome::NetworkFailure {
                cause: format!("failed to parse login response: {e}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_maps_all_fields() {
        let raw: TokenResponse = serde_json::from_str(
            r#"{
                "access_token": "at",
                "token_type": "Bearer",
                "id_token": "it",
                "refresh_token": "rt"
            }"#,
        )
        .unwrap();
        let credentials = raw.into_credentials();
        assert_eq!(credentials.access_token.as_deref(), Some("at"));
        assert_eq!(credentials.token_type.as_deref(), Some("Bearer"));
        assert_eq!(credentials.id_token.as_deref(), Some("it"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("rt"));
    }

    #[test]
    fn test_token_response_tolerates_minimal_body() {
        let raw: TokenResponse = serde_json::from_str(r#"{"access_token": "at"}"#).unwrap();
        let credentials = raw.into_credentials();
        assert_eq!(credentials.access_token.as_deref(), Some("at"));
        assert!(credentials.token_type.is_none());
        assert!(credentials.refresh_token.is_none());
    }

    #[test]
    fn test_token_response_requires_access_token() {
        let result = serde_json::from_str::<TokenResponse>(r#"{"token_type": "Bearer"}"#);
        assert!(result.is_err(), "access_token is mandatory in the response");
    }
}
