//! Configuration for AuthFlow
//!
//! This module holds the static inputs an authorization attempt needs:
//! the identity-provider account ([`AccountConfig`]) and per-flow behaviour
//! ([`FlowOptions`]). Both are built programmatically by the host and
//! validated up front, before any network I/O.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::types::AgentKind;
use crate::error::{AuthFlowError, Result};

/// Default overall deadline for one authorization attempt, covering both the
/// wait for the redirect and the token exchange.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Identity-provider account configuration
///
/// Describes the tenant the flow authenticates against: the OAuth2 client id
/// plus the authorize and token endpoints.
///
/// # Examples
///
/// ```
/// use authflow::config::AccountConfig;
///
/// let account = AccountConfig {
///     client_id: "my-client-id".to_string(),
///     authorize_url: Some("https://tenant.example.com/authorize".to_string()),
///     token_url: "https://tenant.example.com/oauth/token".to_string(),
/// };
///
/// assert!(account.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// OAuth2 client identifier issued by the identity provider
    pub client_id: String,

    /// Base authorize endpoint URL. May be absent for accounts that only
    /// use the direct-credentials login; starting a web flow without it
    /// fails with a configuration error.
    #[serde(default)]
    pub authorize_url: Option<String>,

    /// Token endpoint URL used for the code exchange and direct logins
    pub token_url: String,
}

impl AccountConfig {
    /// Validates the static configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Config`] when the client id is empty, the
    /// token URL does not parse, or an authorize URL is present but
    /// malformed.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthFlowError::Config("client_id must not be empty".to_string()).into());
        }
        Url::parse(&self.token_url)
            .map_err(|e| AuthFlowError::Config(format!("malformed token URL: {e}")))?;
        if let Some(ref raw) = self.authorize_url {
            Url::parse(raw)
                .map_err(|e| AuthFlowError::Config(format!("malformed authorize URL: {e}")))?;
        }
        Ok(())
    }

    /// Returns the parsed authorize endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Config`] when the authorize URL is absent or
    /// malformed. This is checked before any network I/O happens.
    pub(crate) fn authorize_endpoint(&self) -> Result<Url> {
        let raw = self.authorize_url.as_deref().ok_or_else(|| {
            AuthFlowError::Config("authorize URL is not set for this account".to_string())
        })?;
        let url = Url::parse(raw)
            .map_err(|e| AuthFlowError::Config(format!("malformed authorize URL: {e}")))?;
        Ok(url)
    }
}

/// Per-flow behaviour options
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use authflow::auth::types::AgentKind;
/// use authflow::config::FlowOptions;
///
/// let options = FlowOptions::default();
/// assert_eq!(options.agent, AgentKind::External);
/// assert_eq!(options.attempt_timeout, Duration::from_secs(300));
/// ```
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Which redirect agent to authenticate with: the system browser
    /// (`External`) or an in-process web surface (`Embedded`).
    pub agent: AgentKind,

    /// Overall deadline for one attempt. The clock starts when the request
    /// is issued and covers both the wait for the redirect return and the
    /// token exchange.
    pub attempt_timeout: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            agent: AgentKind::External,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_account() -> AccountConfig {
        AccountConfig {
            client_id: "client-123".to_string(),
            authorize_url: Some("https://tenant.example.com/authorize".to_string()),
            token_url: "https://tenant.example.com/oauth/token".to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // validate()
    // -----------------------------------------------------------------------

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(make_account().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_client_id() {
        let mut account = make_account();
        account.client_id = "  ".to_string();
        let msg = account.validate().unwrap_err().to_string();
        assert!(msg.contains("client_id"), "unexpected message: {msg}");
    }

    #[test]
    fn test_validate_rejects_malformed_token_url() {
        let mut account = make_account();
        account.token_url = "not a url".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_absent_authorize_url() {
        let mut account = make_account();
        account.authorize_url = None;
        assert!(account.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_authorize_url() {
        let mut account = make_account();
        account.authorize_url = Some("::::".to_string());
        assert!(account.validate().is_err());
    }

    // -----------------------------------------------------------------------
    // authorize_endpoint()
    // -----------------------------------------------------------------------

    #[test]
    fn test_authorize_endpoint_parses_url() {
        let endpoint = make_account().authorize_endpoint().unwrap();
        assert_eq!(endpoint.host_str(), Some("tenant.example.com"));
    }

    #[test]
    fn test_authorize_endpoint_fails_when_absent() {
        let mut account = make_account();
        account.authorize_url = None;
        let msg = account.authorize_endpoint().unwrap_err().to_string();
        assert!(
            msg.contains("authorize URL is not set"),
            "unexpected message: {msg}"
        );
    }

    // -----------------------------------------------------------------------
    // FlowOptions
    // -----------------------------------------------------------------------

    #[test]
    fn test_flow_options_default_uses_external_agent() {
        let options = FlowOptions::default();
        assert_eq!(options.agent, AgentKind::External);
    }

    #[test]
    fn test_flow_options_default_timeout_is_five_minutes() {
        let options = FlowOptions::default();
        assert_eq!(options.attempt_timeout, Duration::from_secs(300));
    }
}
