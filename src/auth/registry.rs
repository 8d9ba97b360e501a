//! Pending-request registry
//!
//! Tracks the single in-flight authorization attempt between the issuing
//! path and the resume path. The slot is the only shared mutable state in
//! the flow; every access is a short critical section and the lock is never
//! held across an await point, so "read-then-clear" is atomic with respect
//! to a racing `begin`, `resume`, or `cancel`.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::auth::request::AuthorizationRequest;
use crate::auth::types::{AuthOutcome, CorrelationId};

// ---------------------------------------------------------------------------
// PendingAttempt
// ---------------------------------------------------------------------------

/// One registered attempt: the immutable request plus the single-shot
/// channel and cancellation token that resolve it.
pub(crate) struct PendingAttempt {
    /// The issued request this attempt is waiting on
    pub request: AuthorizationRequest,

    /// Sender half of the attempt's outcome channel. Consuming it is what
    /// enforces at-most-once delivery.
    pub outcome_tx: oneshot::Sender<AuthOutcome>,

    /// Token cancelling the attempt's in-flight work
    pub cancel: CancellationToken,
}

// ---------------------------------------------------------------------------
// PendingRegistry
// ---------------------------------------------------------------------------

/// Holds zero or one [`PendingAttempt`].
pub(crate) struct PendingRegistry {
    slot: Mutex<Option<PendingAttempt>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingAttempt>> {
        // Poisoning only occurs if a holder panicked inside one of these
        // short sections, which would already be a bug.
        self.slot.lock().expect("pending registry lock poisoned")
    }

    /// Registers a new pending attempt, returning the superseded one when
    /// the slot was occupied. The superseded attempt's eventual return is
    /// stale from this point on and will no longer resolve.
    pub fn begin(&self, attempt: PendingAttempt) -> Option<PendingAttempt> {
        self.lock().replace(attempt)
    }

    /// Atomically removes and returns the pending attempt when the id
    /// matches.
    ///
    /// A `None` id means the return arrived through the platform's generic
    /// redirect entry point, which carries no request code; it matches
    /// whatever single attempt is pending. A mismatched id leaves the slot
    /// untouched and returns `None`: the return is not ours and propagates
    /// to the caller's default handling.
    pub fn resolve(&self, id: Option<CorrelationId>) -> Option<PendingAttempt> {
        let mut slot = self.lock();
        match (slot.as_ref(), id) {
            (Some(pending), Some(id)) if pending.request.correlation_id == id => slot.take(),
            (Some(_), Some(_)) => None,
            (Some(_), None) => slot.take(),
            (None, _) => None,
        }
    }

    /// Removes any pending attempt without delivering an outcome.
    pub fn clear(&self) -> Option<PendingAttempt> {
        self.lock().take()
    }

    /// The correlation id of the pending attempt, if any.
    pub fn pending_id(&self) -> Option<CorrelationId> {
        self.lock().as_ref().map(|p| p.request.correlation_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
