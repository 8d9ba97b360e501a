//! Browser/webview-mediated OAuth2 authorization
//!
//! This module implements the authorization round-trip state machine: a
//! correlated, anti-CSRF-protected authorization request is issued and
//! launched, the flow suspends across the external redirect, the
//! asynchronous return is validated against the pending request, and -- for
//! the code grant -- the authorization code is exchanged for a token set
//! before exactly one terminal outcome is delivered.
//!
//! # Module Layout
//!
//! - [`pkce`]      -- state token and PKCE `S256` pair generation
//! - [`request`]   -- authorization request + authorize-URI builder
//! - [`types`]     -- correlation ids, redirect payloads, credentials,
//!   outcomes
//! - `correlator`  -- redirect-return validation and classification
//! - [`exchange`]  -- token endpoint clients (code exchange, direct login)
//! - [`launcher`]  -- redirect agents (system browser, host surfaces)
//! - [`resolver`]  -- strategy-name → flow-variant lookup
//! - [`flow`]      -- the `WebAuthFlow` façade: begin / resume / cancel
//! - `registry`    -- the single-slot pending-request registry

pub(crate) mod correlator;
pub mod exchange;
pub mod flow;
pub mod launcher;
pub mod pkce;
pub(crate) mod registry;
pub mod request;
pub mod resolver;
pub mod types;
