//! Redirect launchers
//!
//! Starting an authorization attempt means handing the composed authorize
//! URI to a redirect agent. For the external kind that is the platform's
//! generic open-URI capability; there is no direct code path for
//! completion, the return arrives later through the host's redirect entry
//! point. For the embedded kind the host opens an in-process web surface
//! initialized with the URI and the attempt's correlation id, and that
//! surface's completion signal becomes the redirect result.
//!
//! Exactly one launcher invocation happens per authorization request.

use async_trait::async_trait;
use url::Url;

use crate::auth::types::{AgentKind, CorrelationId};
use crate::error::{AuthFlowError, Result};

// ---------------------------------------------------------------------------
// RedirectLauncher
// ---------------------------------------------------------------------------

/// Capability to open the composed authorize URI via the chosen agent.
///
/// Implemented by the host. The flow calls this exactly once per issued
/// request, right after the request is registered as pending.
#[async_trait]
pub trait RedirectLauncher: Send + Sync {
    /// Opens `uri` with the given agent kind.
    ///
    /// `correlation_id` identifies the attempt; an embedded surface must
    /// carry it into its completion signal so the return can be matched.
    ///
    /// # Errors
    ///
    /// Any failure to start the agent. The flow withdraws the pending
    /// request when launching fails, so a failed launch never leaves a
    /// dangling attempt.
    async fn open(&self, uri: &Url, agent: AgentKind, correlation_id: CorrelationId)
        -> Result<()>;
}

// ---------------------------------------------------------------------------
// SystemBrowserLauncher
// ---------------------------------------------------------------------------

/// Launcher backed by the operating system's default browser.
///
/// Only handles [`AgentKind::External`]; an embedded surface is inherently
/// host-specific and must be provided by the embedder.
pub struct SystemBrowserLauncher;

#[async_trait]
impl RedirectLauncher for SystemBrowserLauncher {
    async fn open(
        &self,
        uri: &Url,
        agent: AgentKind,
        correlation_id: CorrelationId,
    ) -> Result<()> {
        match agent {
            AgentKind::External => {
                tracing::debug!(%correlation_id, "opening authorize URI in system browser");
                open_in_browser(uri.as_str())
            }
            AgentKind::Embedded => Err(AuthFlowError::Launch(
                "embedded agent requires a host-provided web surface".to_string(),
            )
            .into()),
        }
    }
}

/// Hands a URL to the platform's opener command.
fn open_in_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let spawned = std::process::Command::new("open").arg(url).spawn();

    #[cfg(target_os = "linux")]
    let spawned = std::process::Command::new("xdg-open").arg(url).spawn();

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    let spawned: std::io::Result<std::process::Child> = Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no browser opener on this platform",
    ));

    spawned
        .map(|_| ())
        .map_err(|e| AuthFlowError::Launch(format!("failed to open browser: {e}")).into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
