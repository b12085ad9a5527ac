//! # Token Rotation State Machine
//!
//! Gives a displayed credential a bounded lifespan. While `Active`, the
//! rotation holds one [`RotationToken`]; every full interval the token is
//! superseded by a new one.
//!
//! ## States
//!
//! ```text
//! Idle ──start──▶ Active(0) ──tick──▶ Active(1) ──tick──▶ … ──stop──▶ Stopped
//!                    ▲                                                 │
//!                    └──────────────────start──────────────────────────┘
//! ```
//!
//! Entering `Active` always starts a full-length window; a restart after
//! `stop` is not a resumption. `rotate` is rejected outside `Active`, so
//! no rotation can happen after `stop`.
//!
//! The machine has no clock and keeps no time. Whoever owns the window
//! deadline calls [`TokenRotation::rotate()`] when it expires.

use std::time::Duration;

use clubpass_core::{RotationToken, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Draws attempted before a stuck token source is disambiguated.
const MAX_REDRAWS: usize = 4;

// ─── Token Sources ───────────────────────────────────────────────────

/// Produces candidate tokens for new rotation windows.
pub trait TokenSource {
    /// Produce the next candidate token.
    fn next_token(&mut self) -> RotationToken;
}

/// Random UUID-based tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&mut self) -> RotationToken {
        RotationToken::generate()
    }
}

/// Wall-clock millisecond tokens, strictly increasing within one source.
#[derive(Debug, Clone, Default)]
pub struct ClockTokens {
    last: i64,
}

impl TokenSource for ClockTokens {
    fn next_token(&mut self) -> RotationToken {
        let now = Timestamp::now().epoch_millis();
        let next = now.max(self.last.saturating_add(1));
        self.last = next;
        RotationToken::from_string(next.to_string())
    }
}

impl<F> TokenSource for F
where
    F: FnMut() -> RotationToken,
{
    fn next_token(&mut self) -> RotationToken {
        self()
    }
}

// ─── Rotation State ──────────────────────────────────────────────────

/// Lifecycle state of a token rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationState {
    /// Never started.
    Idle,
    /// Holding a live token.
    Active,
    /// Halted. Only `start` leaves this state.
    Stopped,
}

impl std::fmt::Display for RotationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Active => "ACTIVE",
            Self::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Errors from rotation transitions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RotationError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid rotation transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// A rotation interval must be longer than zero.
    #[error("rotation interval must be greater than zero")]
    ZeroInterval,
}

// ─── Token Rotation ──────────────────────────────────────────────────

/// A rotating token with a fixed window length.
#[derive(Debug, Clone)]
pub struct TokenRotation {
    interval: Duration,
    state: RotationState,
    token: Option<RotationToken>,
    generation: u64,
}

impl TokenRotation {
    /// Create an idle rotation with the given window length.
    pub fn new(interval: Duration) -> Result<Self, RotationError> {
        if interval.is_zero() {
            return Err(RotationError::ZeroInterval);
        }
        Ok(Self {
            interval,
            state: RotationState::Idle,
            token: None,
            generation: 0,
        })
    }

    /// Enter `Active` with a fresh token and a full-length window
    /// (IDLE or STOPPED → ACTIVE).
    pub fn start(&mut self, source: &mut impl TokenSource) -> Result<&RotationToken, RotationError> {
        if self.state == RotationState::Active {
            return Err(self.invalid("ACTIVE"));
        }
        let token = self.fresh_token(source);
        self.state = RotationState::Active;
        self.generation = 0;
        tracing::debug!(token = token.short(), "token rotation started");
        Ok(&*self.token.insert(token))
    }

    /// Expire the current window now and open a new full-length one
    /// (ACTIVE → ACTIVE).
    pub fn rotate(&mut self, source: &mut impl TokenSource) -> Result<&RotationToken, RotationError> {
        self.require_active("ACTIVE")?;
        let token = self.next_generation(source);
        Ok(&*self.token.insert(token))
    }

    /// Halt rotation and discard the token (ACTIVE → STOPPED).
    pub fn stop(&mut self) -> Result<(), RotationError> {
        self.require_active("STOPPED")?;
        self.state = RotationState::Stopped;
        self.token = None;
        tracing::debug!(generation = self.generation, "token rotation stopped");
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RotationState {
        self.state
    }

    /// Window length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Live token, if active.
    pub fn current_token(&self) -> Option<&RotationToken> {
        self.token.as_ref()
    }

    /// Number of rotations since the last `start`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn next_generation(&mut self, source: &mut impl TokenSource) -> RotationToken {
        let token = self.fresh_token(source);
        self.generation += 1;
        tracing::trace!(generation = self.generation, token = token.short(), "token rotated");
        token
    }

    /// Draw a token that differs from the live one.
    fn fresh_token(&self, source: &mut impl TokenSource) -> RotationToken {
        let Some(current) = self.token.as_ref() else {
            return source.next_token();
        };
        for _ in 0..MAX_REDRAWS {
            let candidate = source.next_token();
            if &candidate != current {
                return candidate;
            }
        }
        tracing::warn!("token source repeated itself; suffixing generation");
        RotationToken::from_string(format!("{}-{}", current, self.generation + 1))
    }

    fn require_active(&self, target: &str) -> Result<(), RotationError> {
        if self.state != RotationState::Active {
            return Err(self.invalid(target));
        }
        Ok(())
    }

    fn invalid(&self, target: &str) -> RotationError {
        RotationError::InvalidTransition {
            from: self.state.to_string(),
            to: target.to_string(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
