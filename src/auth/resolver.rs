//! Provider resolution
//!
//! Maps a connection's strategy name to the flow variant that authenticates
//! it: the direct-credentials login, or the browser/webview authorization
//! round trip. The table is built once at configuration time and is
//! immutable afterwards; resolution is a pure lookup with no I/O. An
//! unresolved strategy is not an error -- the caller falls back to the
//! default web flow.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// FlowVariant
// ---------------------------------------------------------------------------

/// The flow a strategy resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowVariant {
    /// Direct resource-owner credentials against the login endpoint; no
    /// redirect round trip
    Native,

    /// The browser/webview authorization round trip
    Web,
}

// ---------------------------------------------------------------------------
// ProviderTable
// ---------------------------------------------------------------------------

/// Immutable strategy-name → flow-variant lookup table.
///
/// # Examples
///
/// ```
/// use authflow::auth::resolver::{FlowVariant, ProviderTable};
///
/// let table = ProviderTable::new()
///     .with_strategy("auth0", FlowVariant::Native)
///     .with_strategy("google-oauth2", FlowVariant::Web);
///
/// assert_eq!(table.resolve("auth0"), Some(FlowVariant::Native));
/// assert_eq!(table.resolve("unknown"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    entries: HashMap<String, FlowVariant>,
}

impl ProviderTable {
    /// Creates an empty table; every strategy falls back to the caller's
    /// default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a strategy mapping, consuming and returning the table so
    /// construction reads as one expression.
    pub fn with_strategy(mut self, strategy: impl Into<String>, variant: FlowVariant) -> Self {
        self.entries.insert(strategy.into(), variant);
        self
    }

    /// Resolves a strategy name to its flow variant.
    ///
    /// Returns `None` for unknown strategies; the caller defines the
    /// fallback (normally the generic web flow). Never errors.
    pub fn resolve(&self, strategy: &str) -> Option<FlowVariant> {
        self.entries.get(strategy).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
