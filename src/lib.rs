//! AuthFlow - browser-mediated OAuth2 login flows with PKCE
//!
//! This library authenticates an end user against a remote identity
//! provider through a browser- or embedded-webview-mediated OAuth2 flow
//! (implicit grant, or authorization code with PKCE) and delivers exactly
//! one authentication outcome per attempt.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: the authorization round-trip state machine and its components
//! - `config`: account and flow configuration with up-front validation
//! - `error`: error types and result aliases
//!
//! The host supplies two outbound capabilities -- a redirect launcher and a
//! token endpoint client -- and drives the flow through three entry points:
//! `begin`, `resume`, and `cancel`.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use authflow::{AccountConfig, FlowOptions, WebAuthFlow};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let account = AccountConfig {
//!         client_id: "client-123".to_string(),
//!         authorize_url: Some("https://tenant.example.com/authorize".to_string()),
//!         token_url: "https://tenant.example.com/oauth/token".to_string(),
//!     };
//!     let flow = Arc::new(WebAuthFlow::with_system_browser(
//!         account,
//!         FlowOptions::default(),
//!         Arc::new(reqwest::Client::new()),
//!     ));
//!
//!     let attempt = flow
//!         .begin("google-oauth2", &BTreeMap::new(), "https://app.example.com/callback", true)
//!         .await?;
//!
//!     // The host's redirect entry point calls flow.resume(...) when the
//!     // provider sends the user back; the outcome resolves here.
//!     if let Some(outcome) = attempt.outcome().await {
//!         println!("authentication finished: {outcome:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use auth::exchange::{DatabaseClient, HttpTokenEndpoint, TokenEndpoint};
pub use auth::flow::{AuthAttempt, WebAuthFlow};
pub use auth::launcher::{RedirectLauncher, SystemBrowserLauncher};
pub use auth::pkce::PkcePair;
pub use auth::request::AuthorizationRequest;
pub use auth::resolver::{FlowVariant, ProviderTable};
pub use auth::types::{AgentKind, AuthOutcome, CorrelationId, Credentials, RedirectResult};
pub use config::{AccountConfig, FlowOptions};
pub use error::{AuthFlowError, Result};
