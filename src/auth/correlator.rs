//! Redirect-return classification
//!
//! Validates the parameters of an accepted redirect return against the
//! pending request and classifies them into either a terminal outcome or a
//! code-exchange handoff. The caller has already matched the return to the
//! pending request by correlation id and consumed the registry slot, so
//! everything here is pure classification.
//!
//! Validation order, first match wins:
//!
//! 1. An `error` marker: `access_denied` (any casing) is a user denial,
//!    anything else is an invalid response with the raw detail attached.
//! 2. The `state` check: a mismatch is an anti-CSRF failure and is never
//!    downgraded; an absent `state` on a request that embedded one is an
//!    invalid response.
//! 3. Code grant: the `code` parameter is handed to the token exchanger.
//! 4. Implicit grant: tokens are read directly from the parameters.

use std::collections::HashMap;

use crate::auth::request::AuthorizationRequest;
use crate::auth::types::{AuthOutcome, Credentials};

/// Error marker value signalling that the user cancelled or was denied.
const ERROR_VALUE_ACCESS_DENIED: &str = "access_denied";

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Result of classifying a redirect return.
pub(crate) enum Correlation {
    /// Terminal outcome; no further work
    Complete(AuthOutcome),

    /// The code grant returned an authorization code; exchange it using the
    /// request's PKCE verifier
    ExchangeCode {
        /// The `code` parameter of the return
        code: String,
    },
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Classifies the parameters of a correlated redirect return.
pub(crate) fn classify(
    request: &AuthorizationRequest,
    parameters: &HashMap<String, String>,
) -> Correlation {
    if let Some(error) = parameters.get("error") {
        return if error.eq_ignore_ascii_case(ERROR_VALUE_ACCESS_DENIED) {
            tracing::debug!(correlation_id = %request.correlation_id, "access denied by user");
            Correlation::Complete(AuthOutcome::Denied)
        } else {
            Correlation::Complete(AuthOutcome::InvalidResponse {
                detail: format!("authorization error: {error}"),
            })
        };
    }

    match parameters.get("state") {
        Some(returned) if *returned != request.state => {
            // Security-relevant: a forged or replayed redirect.
            tracing::warn!(
                correlation_id = %request.correlation_id,
                "state mismatch in authorization response"
            );
            return Correlation::Complete(AuthOutcome::StateMismatch);
        }
        Some(_) => {}
        None => {
            // The request embedded a state token; a return without one
            // would void the anti-CSRF check if accepted.
            return Correlation::Complete(AuthOutcome::InvalidResponse {
                detail: "state parameter missing from response".to_string(),
            });
        }
    }

    if request.pkce.is_some() {
        match parameters.get("code") {
            Some(code) => Correlation::ExchangeCode { code: code.clone() },
            None => Correlation::Complete(AuthOutcome::InvalidResponse {
                detail: "authorization code missing from response".to_string(),
            }),
        }
    } else {
        let credentials = Credentials {
            id_token: parameters.get("id_token").cloned(),
            access_token: parameters.get("access_token").cloned(),
            token_type: parameters.get("token_type").cloned(),
            refresh_token: parameters.get("refresh_token").cloned(),
        };
        if credentials.access_token.is_none() {
            Correlation::Complete(AuthOutcome::InvalidResponse {
                detail: "access token missing from response".to_string(),
            })
        } else {
            Correlation::Complete(AuthOutcome::Success(credentials))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::auth::request::build_authorization_request;
    use crate::auth::types::AgentKind;
    use crate::config::AccountConfig;

    fn make_request(use_pkce: bool) -> AuthorizationRequest {
        let account = AccountConfig {
            client_id: "client-123".to_string(),
            authorize_url: Some("https://tenant.example.com/authorize".to_string()),
            token_url: "https://tenant.example.com/oauth/token".to_string(),
        };
        build_authorization_request(
            &account,
            "twitter",
            &BTreeMap::new(),
            "https://app.example.com/callback",
            AgentKind::External,
            use_pkce,
        )
        .unwrap()
        .0
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expect_complete(correlation: Correlation) -> AuthOutcome {
        match correlation {
            Correlation::Complete(outcome) => outcome,
            Correlation::ExchangeCode { .. } => panic!("expected a terminal outcome"),
        }
    }

    // -----------------------------------------------------------------------
    // Error marker
    // -----------------------------------------------------------------------

    #[test]
    fn test_access_denied_classifies_as_denied() {
        let request = make_request(false);
        let state = request.state.clone();
        let outcome = expect_complete(classify(
            &request,
            &params(&[("state", &state), ("error", "access_denied")]),
        ));
        assert_eq!(outcome, AuthOutcome::Denied);
    }

    #[test]
    fn test_access_denied_comparison_ignores_case() {
        let request = make_request(false);
        let outcome =
            expect_complete(classify(&request, &params(&[("error", "Access_Denied")])));
        assert_eq!(outcome, AuthOutcome::Denied);
    }

    #[test]
    fn test_other_error_markers_are_invalid_responses_with_detail() {
        let request = make_request(false);
        let outcome =
            expect_complete(classify(&request, &params(&[("error", "server_error")])));
        match outcome {
            AuthOutcome::InvalidResponse { detail } => {
                assert!(detail.contains("server_error"), "detail lost: {detail}")
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_error_marker_wins_over_state_check() {
        // Even with a mismatched state, an explicit error marker classifies
        // first.
        let request = make_request(false);
        let outcome = expect_complete(classify(
            &request,
            &params(&[("state", "wrong"), ("error", "access_denied")]),
        ));
        assert_eq!(outcome, AuthOutcome::Denied);
    }

    // -----------------------------------------------------------------------
    // State validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_mismatched_state_is_a_state_mismatch() {
        let request = make_request(false);
        let outcome = expect_complete(classify(
            &request,
            &params(&[("state", "forged"), ("access_token", "at")]),
        ));
        assert_eq!(outcome, AuthOutcome::StateMismatch);
    }

    #[test]
    fn test_absent_state_is_an_invalid_response() {
        let request = make_request(false);
        let outcome =
            expect_complete(classify(&request, &params(&[("access_token", "at")])));
        assert!(matches!(outcome, AuthOutcome::InvalidResponse { .. }));
    }

    #[test]
    fn test_state_comparison_is_exact() {
        let request = make_request(false);
        let almost = format!("{}x", request.state);
        let outcome = expect_complete(classify(
            &request,
            &params(&[("state", &almost), ("access_token", "at")]),
        ));
        assert_eq!(outcome, AuthOutcome::StateMismatch);
    }

    // -----------------------------------------------------------------------
    // Code grant
    // -----------------------------------------------------------------------

    #[test]
    fn test_code_grant_hands_off_the_code() {
        let request = make_request(true);
        let state = request.state.clone();
        match classify(&request, &params(&[("state", &state), ("code", "c-42")])) {
            Correlation::ExchangeCode { code } => assert_eq!(code, "c-42"),
            Correlation::Complete(outcome) => panic!("expected a handoff, got {outcome:?}"),
        }
    }

    #[test]
    fn test_code_grant_without_code_is_invalid() {
        let request = make_request(true);
        let state = request.state.clone();
        let outcome = expect_complete(classify(&request, &params(&[("state", &state)])));
        assert!(matches!(outcome, AuthOutcome::InvalidResponse { .. }));
    }

    // -----------------------------------------------------------------------
    // Implicit grant
    // -----------------------------------------------------------------------

    #[test]
    fn test_implicit_grant_reads_tokens_from_parameters() {
        let request = make_request(false);
        let state = request.state.clone();
        let outcome = expect_complete(classify(
            &request,
            &params(&[
                ("state", &state),
                ("access_token", "at"),
                ("id_token", "it"),
                ("token_type", "Bearer"),
            ]),
        ));
        let credentials = outcome.credentials().expect("must succeed");
        assert_eq!(credentials.access_token.as_deref(), Some("at"));
        assert_eq!(credentials.id_token.as_deref(), Some("it"));
        assert_eq!(credentials.token_type.as_deref(), Some("Bearer"));
        assert_eq!(credentials.refresh_token, None);
    }

    #[test]
    fn test_implicit_grant_without_access_token_is_invalid() {
        let request = make_request(false);
        let state = request.state.clone();
        let outcome = expect_complete(classify(
            &request,
            &params(&[("state", &state), ("id_token", "it")]),
        ));
        match outcome {
            AuthOutcome::InvalidResponse { detail } => {
                assert!(detail.contains("access token"), "unexpected detail: {detail}")
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let request = make_request(false);
        let state = request.state.clone();
        let outcome = expect_complete(classify(
            &request,
            &params(&[
                ("state", &state),
                ("access_token", "at"),
                ("utm_source", "promo"),
            ]),
        ));
        assert!(outcome.is_success());
    }
}
