//! # Countdown
//!
//! A deadline shared by the credential display and the rotation trigger.
//! The display reads [`Countdown::progress()`] to draw its bar; the
//! rotation task awaits [`Countdown::expired()`]. Both observe the same
//! instant, so the bar completes exactly when the token rotates.
//!
//! Uses `tokio::time::Instant`, which follows the paused test clock.

use std::time::Duration;

use tokio::time::Instant;

/// Colour band of the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressBand {
    /// First half of the window.
    Fresh,
    /// Second half of the window.
    Ageing,
    /// Window over.
    Expiring,
}

/// A fixed-length window ending at a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started: Instant,
    length: Duration,
}

impl Countdown {
    /// A window of `length` starting now.
    pub fn start(length: Duration) -> Self {
        Self::starting_at(Instant::now(), length)
    }

    /// A window of `length` starting at `started`.
    pub fn starting_at(started: Instant, length: Duration) -> Self {
        Self { started, length }
    }

    /// The window that begins when this one ends.
    pub fn next(&self) -> Self {
        Self::starting_at(self.deadline(), self.length)
    }

    /// End of the window.
    pub fn deadline(&self) -> Instant {
        self.started + self.length
    }

    /// Window length.
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Time left; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// Fraction elapsed, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        if self.length.is_zero() {
            return 1.0;
        }
        let elapsed = Instant::now().saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.length.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Indicator band for the current progress.
    pub fn band(&self) -> ProgressBand {
        let progress = self.progress();
        if progress >= 1.0 {
            ProgressBand::Expiring
        } else if progress >= 0.5 {
            ProgressBand::Ageing
        } else {
            ProgressBand::Fresh
        }
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline()
    }

    /// Resolve at the deadline. Dropping the future cancels the wait.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.deadline()).await;
    }
}
