//! Web authorization flow façade
//!
//! [`WebAuthFlow`] ties the flow's components together behind the three
//! entry points a host uses: [`begin`](WebAuthFlow::begin) issues a
//! correlated authorization request and launches the redirect agent,
//! [`resume`](WebAuthFlow::resume) delivers the asynchronous redirect
//! return, and [`cancel`](WebAuthFlow::cancel) aborts the pending attempt.
//!
//! Each `begin` hands back an [`AuthAttempt`] whose single-shot channel
//! delivers the terminal [`AuthOutcome`] -- at most once, no matter how the
//! attempt ends. The issuing path and the resume path may run on different
//! tasks; the pending-request registry is the only state they share.
//!
//! # Flow overview
//!
//! 1. Generate the state token and, when requested, the PKCE pair.
//! 2. Compose the authorize URI and register the request as pending,
//!    superseding any stale predecessor.
//! 3. Launch the redirect agent and arm the attempt's deadline.
//! 4. (suspension across the external redirect)
//! 5. `resume` matches the return against the pending request, classifies
//!    it, and -- for the code grant -- exchanges the code under the
//!    remaining deadline budget.
//! 6. Deliver exactly one outcome.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::auth::correlator::{self, Correlation};
use crate::auth::exchange::{HttpTokenEndpoint, TokenEndpoint};
use crate::auth::launcher::{RedirectLauncher, SystemBrowserLauncher};
use crate::auth::registry::{PendingAttempt, PendingRegistry};
use crate::auth::request::{self, AuthorizationRequest};
use crate::auth::types::{AuthOutcome, CorrelationId, RedirectResult};
use crate::config::{AccountConfig, FlowOptions};
use crate::error::Result;

// ---------------------------------------------------------------------------
// AuthAttempt
// ---------------------------------------------------------------------------

/// Handle to one issued authorization attempt.
///
/// Holds the receiving half of the attempt's outcome channel. Awaiting
/// [`outcome`](Self::outcome) suspends until the attempt terminates.
#[derive(Debug)]
pub struct AuthAttempt {
    correlation_id: CorrelationId,
    outcome_rx: oneshot::Receiver<AuthOutcome>,
}

impl AuthAttempt {
    /// The request code this attempt's redirect return must carry (or omit,
    /// for returns through the generic redirect entry point).
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Waits for the terminal outcome.
    ///
    /// Returns `None` when the attempt was superseded by a newer `begin`:
    /// the superseded attempt's channel closes without an outcome ever
    /// being sent.
    pub async fn outcome(self) -> Option<AuthOutcome> {
        self.outcome_rx.await.ok()
    }
}

// ---------------------------------------------------------------------------
// WebAuthFlow
// ---------------------------------------------------------------------------

/// Drives the browser/webview-mediated OAuth2 authorization round trip.
///
/// # Thread safety
///
/// All entry points take `&self`; wrap the flow in an `Arc` to share it
/// between the issuing path and whichever task receives redirect returns.
///
/// # Examples
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
/// use authflow::auth::flow::WebAuthFlow;
/// use authflow::config::{AccountConfig, FlowOptions};
///
/// # async fn example() -> authflow::error::Result<()> {
/// let account = AccountConfig {
///     client_id: "client-123".to_string(),
///     authorize_url: Some("https://tenant.example.com/authorize".to_string()),
///     token_url: "https://tenant.example.com/oauth/token".to_string(),
/// };
/// let flow = Arc::new(WebAuthFlow::with_system_browser(
///     account,
///     FlowOptions::default(),
///     Arc::new(reqwest::Client::new()),
/// ));
///
/// let attempt = flow
///     .begin("google-oauth2", &BTreeMap::new(), "https://app.example.com/callback", true)
///     .await?;
/// // ... the host delivers the redirect return via flow.resume(...) ...
/// let outcome = attempt.outcome().await;
/// # Ok(())
/// # }
/// ```
pub struct WebAuthFlow {
    account: AccountConfig,
    options: FlowOptions,
    launcher: Arc<dyn RedirectLauncher>,
    token_endpoint: Arc<dyn TokenEndpoint>,
    registry: Arc<PendingRegistry>,

    /// Cancellation token of the most recently issued attempt. Kept here so
    /// `cancel` can reach an exchange that already left the registry.
    active: Mutex<Option<(CorrelationId, CancellationToken)>>,
}

impl WebAuthFlow {
    /// Creates a flow with explicit launcher and token-endpoint seams.
    pub fn new(
        account: AccountConfig,
        options: FlowOptions,
        launcher: Arc<dyn RedirectLauncher>,
        token_endpoint: Arc<dyn TokenEndpoint>,
    ) -> Self {
        Self {
            account,
            options,
            launcher,
            token_endpoint,
            registry: Arc::new(PendingRegistry::new()),
            active: Mutex::new(None),
        }
    }

    /// Creates a flow wired to the system browser and an HTTP token
    /// endpoint over a shared `reqwest` client.
    pub fn with_system_browser(
        account: AccountConfig,
        options: FlowOptions,
        http: Arc<reqwest::Client>,
    ) -> Self {
        let token_endpoint = HttpTokenEndpoint::new(http, account.clone());
        Self::new(
            account,
            options,
            Arc::new(SystemBrowserLauncher),
            Arc::new(token_endpoint),
        )
    }

    /// Issues an authorization request and launches the redirect agent.
    ///
    /// Any previously pending attempt is superseded: its eventual redirect
    /// return is stale and its outcome channel closes without a value. The
    /// new attempt's deadline starts now and covers both the wait for the
    /// redirect and the token exchange.
    ///
    /// # Arguments
    ///
    /// * `connection` - Identity-provider connection to authenticate
    ///   against.
    /// * `parameters` - Caller parameters merged into the authorize URI
    ///   (provider-required parameters always win, see
    ///   [`build_authorization_request`](request::build_authorization_request)).
    /// * `redirect_uri` - Where the provider sends the user back to.
    /// * `use_pkce` - Use the code grant with PKCE instead of the implicit
    ///   grant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Config`](crate::error::AuthFlowError::Config)
    /// for missing/malformed static inputs (before any I/O), or the
    /// launcher's error when the redirect agent cannot be started. A failed
    /// launch withdraws the request; no outcome is delivered for it.
    pub async fn begin(
        &self,
        connection: &str,
        parameters: &BTreeMap<String, String>,
        redirect_uri: &str,
        use_pkce: bool,
    ) -> Result<AuthAttempt> {
        self.account.validate()?;

        let (request, uri) = request::build_authorization_request(
            &self.account,
            connection,
            parameters,
            redirect_uri,
            self.options.agent,
            use_pkce,
        )?;
        let correlation_id = request.correlation_id;
        let agent = request.agent;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        // A fresh attempt supersedes its predecessor: abort the old
        // attempt's in-flight work before taking over the slot.
        let previous = {
            let mut active = self.lock_active();
            active.replace((correlation_id, cancel.clone()))
        };
        if let Some((old_id, old_token)) = previous {
            old_token.cancel();
            tracing::debug!(superseded = %old_id, "previous authorization attempt superseded");
        }

        // Register before launching so an immediate return cannot miss the
        // slot. The superseded entry's sender is dropped here, closing its
        // channel without an outcome.
        let superseded = self.registry.begin(PendingAttempt {
            request,
            outcome_tx,
            cancel: cancel.clone(),
        });
        drop(superseded);

        self.arm_deadline(correlation_id);

        tracing::debug!(
            %correlation_id,
            connection,
            pkce = use_pkce,
            "authorization request issued"
        );

        if let Err(e) = self.launcher.open(&uri, agent, correlation_id).await {
            // The attempt can never complete; withdraw it. Only drop our
            // own active entry in case a racing begin already replaced it.
            self.registry.resolve(Some(correlation_id));
            let mut active = self.lock_active();
            if matches!(*active, Some((id, _)) if id == correlation_id) {
                active.take();
            }
            return Err(e);
        }

        Ok(AuthAttempt {
            correlation_id,
            outcome_rx,
        })
    }

    /// Delivers an external redirect return.
    ///
    /// Returns whether this flow claimed the callback: `false` when no
    /// request is pending or the correlation id belongs to someone else,
    /// in which case the caller should hand the return to its default
    /// handling. A claimed return always terminates the pending attempt
    /// with exactly one outcome.
    pub async fn resume(&self, result: RedirectResult) -> bool {
        let Some(pending) = self.registry.resolve(result.correlation_id) else {
            tracing::debug!(
                pending = ?self.registry.pending_id(),
                arrived = ?result.correlation_id,
                "redirect return does not match a pending authorization request"
            );
            return false;
        };
        let PendingAttempt {
            request,
            outcome_tx,
            cancel,
        } = pending;

        tracing::debug!(
            correlation_id = %request.correlation_id,
            arrived_via = ?result.arrived_via,
            "redirect return accepted"
        );

        let outcome = match correlator::classify(&request, &result.parameters) {
            Correlation::Complete(outcome) => outcome,
            Correlation::ExchangeCode { code } => {
                self.exchange_under_deadline(&request, &code, &cancel).await
            }
        };

        self.deliver(request.correlation_id, outcome_tx, outcome);
        true
    }

    /// Aborts the pending attempt, if any.
    ///
    /// Clears the registry and cancels an in-flight token exchange; the
    /// attempt terminates with [`AuthOutcome::Cancelled`] and partial
    /// credentials are never delivered. A no-op when nothing is pending.
    pub fn cancel(&self) {
        if let Some((correlation_id, token)) = self.lock_active().take() {
            tracing::debug!(%correlation_id, "cancelling authorization attempt");
            token.cancel();
        }
        // A still-pending attempt (redirect never arrived) resolves here;
        // a mid-exchange attempt resolves through its cancelled select arm.
        if let Some(pending) = self.registry.clear() {
            self.deliver(
                pending.request.correlation_id,
                pending.outcome_tx,
                AuthOutcome::Cancelled,
            );
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<(CorrelationId, CancellationToken)>> {
        self.active.lock().expect("active-attempt lock poisoned")
    }

    /// Spawns the watchdog that times out an attempt whose redirect never
    /// arrives.
    fn arm_deadline(&self, correlation_id: CorrelationId) {
        let registry = Arc::clone(&self.registry);
        let deadline = self.options.attempt_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if let Some(pending) = registry.resolve(Some(correlation_id)) {
                tracing::warn!(
                    %correlation_id,
                    "authorization attempt timed out waiting for the redirect"
                );
                let _ = pending.outcome_tx.send(AuthOutcome::Timeout);
            }
        });
    }

    /// Runs the code exchange under the remainder of the attempt's
    /// deadline, racing it against cancellation.
    async fn exchange_under_deadline(
        &self,
        request: &AuthorizationRequest,
        code: &str,
        cancel: &CancellationToken,
    ) -> AuthOutcome {
        let Some(verifier) = request.pkce.as_ref().map(|pair| pair.verifier.clone()) else {
            // classify only hands off codes for PKCE requests; a missing
            // pair here means the request was tampered with.
            return AuthOutcome::InvalidResponse {
                detail: "authorization code received without an active verifier".to_string(),
            };
        };

        let elapsed = Utc::now()
            .signed_duration_since(request.issued_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let remaining = self.options.attempt_timeout.saturating_sub(elapsed);

        tokio::select! {
            _ = cancel.cancelled() => AuthOutcome::Cancelled,
            exchanged = tokio::time::timeout(
                remaining,
                self.token_endpoint.exchange(code, &verifier, &request.redirect_uri),
            ) => match exchanged {
                Err(_) => {
                    tracing::warn!(
                        correlation_id = %request.correlation_id,
                        "token exchange exceeded the attempt deadline"
                    );
                    AuthOutcome::Timeout
                }
                Ok(Ok(credentials)) => AuthOutcome::Success(credentials),
                Ok(Err(e)) => AuthOutcome::NetworkFailure {
                    cause: e.to_string(),
                },
            },
        }
    }

    /// Sends the terminal outcome down the attempt's channel.
    fn deliver(
        &self,
        correlation_id: CorrelationId,
        outcome_tx: oneshot::Sender<AuthOutcome>,
        outcome: AuthOutcome,
    ) {
        // The attempt is over either way; drop the active token so a later
        // `cancel` has nothing stale to poke. Only clear our own entry: a
        // newer attempt may have replaced it already.
        {
            let mut active = self.lock_active();
            if matches!(*active, Some((id, _)) if id == correlation_id) {
                active.take();
            }
        }
        tracing::debug!(%correlation_id, outcome = outcome_kind(&outcome), "outcome delivered");
        // A dropped receiver means the caller abandoned the attempt; the
        // at-most-once contract still holds.
        let _ = outcome_tx.send(outcome);
    }
}

/// Short label of an outcome for logging, without any payload.
fn outcome_kind(outcome: &AuthOutcome) -> &'static str {
    match outcome {
        AuthOutcome::Success(_) => "success",
        AuthOutcome::Denied => "denied",
        AuthOutcome::StateMismatch => "state_mismatch",
        AuthOutcome::InvalidResponse { .. } => "invalid_response",
        AuthOutcome::NetworkFailure { .. } => "network_failure",
        AuthOutcome::Timeout => "timeout",
        AuthOutcome::Cancelled => "cancelled",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use url::Url;

    use crate::auth::types::{AgentKind, Credentials};
    use crate::error::AuthFlowError;

    struct FailingLauncher;

    #[async_trait]
    impl RedirectLauncher for FailingLauncher {
        async fn open(
            &self,
            _uri: &Url,
            _agent: AgentKind,
            _correlation_id: CorrelationId,
        ) -> Result<()> {
            Err(AuthFlowError::Launch("no agent available".to_string()).into())
        }
    }

    struct UnusedTokenEndpoint;

    #[async_trait]
    impl TokenEndpoint for UnusedTokenEndpoint {
        async fn exchange(
            &self,
            _code: &str,
            _verifier: &str,
            _redirect_uri: &str,
        ) -> Result<Credentials> {
            panic!("the token endpoint must not be called");
        }
    }

    fn make_flow(account: AccountConfig) -> WebAuthFlow {
        WebAuthFlow::new(
            account,
            FlowOptions::default(),
            Arc::new(FailingLauncher),
            Arc::new(UnusedTokenEndpoint),
        )
    }

    fn make_account() -> AccountConfig {
        AccountConfig {
            client_id: "client-123".to_string(),
            authorize_url: Some("https://tenant.example.com/authorize".to_string()),
            token_url: "https://tenant.example.com/oauth/token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_launch_withdraws_the_attempt() {
        let flow = make_flow(make_account());
        let result = flow
            .begin(
                "twitter",
                &BTreeMap::new(),
                "https://app.example.com/callback",
                false,
            )
            .await;
        assert!(result.is_err(), "a failed launch must surface the error");

        // Nothing stays pending after a failed launch.
        let handled = flow
            .resume(RedirectResult {
                correlation_id: None,
                parameters: HashMap::new(),
                arrived_via: AgentKind::External,
            })
            .await;
        assert!(!handled);
    }

    #[tokio::test]
    async fn test_begin_fails_before_launch_on_bad_configuration() {
        let mut account = make_account();
        account.authorize_url = None;
        let flow = make_flow(account);

        let err = flow
            .begin(
                "twitter",
                &BTreeMap::new(),
                "https://app.example.com/callback",
                false,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[tokio::test]
    async fn test_cancel_without_pending_attempt_is_a_no_op() {
        let flow = make_flow(make_account());
        flow.cancel();
    }

    #[test]
    fn test_outcome_kind_labels_carry_no_payload() {
        let outcome = AuthOutcome::NetworkFailure {
            cause: "secret detail".to_string(),
        };
        assert_eq!(outcome_kind(&outcome), "network_failure");
    }
}
