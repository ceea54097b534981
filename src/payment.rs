//! Unlock flow: one user-triggered verification call at a time, driven
//! through Idle → Verifying → Verified, or Verifying → Failed and back.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::{FeedBackend, VerifyRequest};
use crate::error::VerificationFailure;
use crate::gate::Entitlement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    Idle,
    Verifying,
    /// Confirmation on screen; lasts for the display delay.
    Verified,
    Failed { reason: String },
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationState::Idle => write!(f, "idle"),
            VerificationState::Verifying => write!(f, "verifying"),
            VerificationState::Verified => write!(f, "verified"),
            VerificationState::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// Handed out by an accepted submit. Its `attempt` must still be current
/// when the result comes back, otherwise the result is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    pub attempt: u64,
    pub tx_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Verified,
    Failed,
    /// Result of an abandoned attempt; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct PaymentVerificationMachine {
    state: VerificationState,
    tx_ref: String,
    attempt: u64,
    verified_at: Option<Instant>,
    display_for: Duration,
}

impl PaymentVerificationMachine {
    pub fn new(display_for: Duration) -> Self {
        Self {
            state: VerificationState::Idle,
            tx_ref: String::new(),
            attempt: 0,
            verified_at: None,
            display_for,
        }
    }

    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    pub fn tx_ref(&self) -> &str {
        &self.tx_ref
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            VerificationState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_verifying(&self) -> bool {
        self.state == VerificationState::Verifying
    }

    /// Replace the typed reference. Editing a failed attempt clears the
    /// failure; the reference is frozen while verifying or verified.
    pub fn edit(&mut self, tx_ref: impl Into<String>) -> bool {
        match self.state {
            VerificationState::Idle => {}
            VerificationState::Failed { .. } => self.state = VerificationState::Idle,
            VerificationState::Verifying | VerificationState::Verified => return false,
        }
        self.tx_ref = tx_ref.into();
        true
    }

    /// Start verifying `tx_ref`. Rejected (None, state untouched) when the
    /// reference is blank or an attempt is already in flight or confirmed.
    pub fn submit(&mut self, tx_ref: impl Into<String>) -> Option<VerificationTicket> {
        if !matches!(self.state, VerificationState::Idle | VerificationState::Failed { .. }) {
            debug!(state = %self.state, "submit ignored");
            return None;
        }
        let tx_ref = tx_ref.into().trim().to_string();
        if tx_ref.is_empty() {
            return None;
        }

        self.tx_ref = tx_ref;
        self.attempt += 1;
        self.state = VerificationState::Verifying;
        info!(attempt = self.attempt, tx_ref = %self.tx_ref, "payment verification submitted");
        Some(VerificationTicket { attempt: self.attempt, tx_ref: self.tx_ref.clone() })
    }

    /// Submit the reference currently held.
    pub fn retry(&mut self) -> Option<VerificationTicket> {
        let tx_ref = self.tx_ref.clone();
        self.submit(tx_ref)
    }

    /// Apply the outcome of the verification call for `attempt`.
    pub fn resolve(
        &mut self,
        attempt: u64,
        outcome: Result<(), VerificationFailure>,
        entitlement: &mut Entitlement,
        now: Instant,
    ) -> Resolution {
        if attempt != self.attempt || !self.is_verifying() {
            debug!(attempt, current = self.attempt, "discarding abandoned verification result");
            return Resolution::Stale;
        }

        match outcome {
            Ok(()) => {
                self.state = VerificationState::Verified;
                self.verified_at = Some(now);
                entitlement.grant();
                info!(attempt, tx_ref = %self.tx_ref, "payment verified");
                Resolution::Verified
            }
            Err(failure) => {
                let reason = failure.reason();
                warn!(attempt, tx_ref = %self.tx_ref, %reason, "payment verification failed");
                self.state = VerificationState::Failed { reason };
                Resolution::Failed
            }
        }
    }

    /// Once the confirmation has been shown long enough, reset and return
    /// true: the host dialog should close now.
    pub fn poll_display(&mut self, now: Instant) -> bool {
        match (&self.state, self.verified_at) {
            (VerificationState::Verified, Some(at)) if now.duration_since(at) >= self.display_for => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Dialog closed: back to Idle with the reference discarded. An in-flight
    /// call is abandoned and its result will be ignored.
    pub fn close(&mut self) {
        if self.is_verifying() {
            debug!(attempt = self.attempt, "abandoning in-flight verification");
        }
        self.attempt += 1;
        self.reset();
    }

    fn reset(&mut self) {
        self.state = VerificationState::Idle;
        self.tx_ref.clear();
        self.verified_at = None;
    }
}

/// Perform the verification round-trip for `ticket`.
pub async fn run_verification<B: FeedBackend>(
    backend: &B,
    ticket: &VerificationTicket,
    user_id: &str,
) -> Result<(), VerificationFailure> {
    let request = VerifyRequest { tx_ref: ticket.tx_ref.clone(), user_id: user_id.to_string() };
    backend.verify(&request).await
}
