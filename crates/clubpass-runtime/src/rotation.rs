//! # Credential Rotation Task
//!
//! [`start_rotation()`] issues the first credential synchronously, then
//! spawns a task that re-issues it each time the shared [`Countdown`]
//! expires. Each window starts at the previous deadline, so the schedule
//! does not drift with callback latency.
//!
//! ## Teardown
//!
//! [`RotationHandle::stop()`] signals the task and waits for it to exit.
//! Once `stop` returns, `on_rotate` is never called again. Dropping the
//! handle without stopping aborts the task.
//!
//! Ticks are sequential: `on_rotate` for window `n` returns before the
//! countdown for window `n + 1` is awaited.
//!
//! With an activity log attached, the issuance, the start and the stop of
//! the rotation are recorded in it. Individual rotations are not.

use std::time::Duration;

use clubpass_core::{IdentityCredential, SubjectProfile, Timestamp};
use clubpass_state::{RotationError, TokenRotation, TokenSource};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::activity::SharedActivityLog;
use crate::countdown::Countdown;

/// Owner of a running rotation task.
#[derive(Debug)]
pub struct RotationHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    credential: watch::Receiver<IdentityCredential>,
    countdown: watch::Receiver<Countdown>,
}

/// Issue a credential for `profile` and rotate it every `interval`.
///
/// `on_rotate` runs once per window boundary with the newly issued
/// credential. The initial credential is available from
/// [`RotationHandle::current()`] immediately and is not passed to
/// `on_rotate`.
///
/// Must be called from within a Tokio runtime.
pub fn start_rotation<S, F>(
    interval: Duration,
    profile: SubjectProfile,
    mut source: S,
    activity: Option<SharedActivityLog>,
    mut on_rotate: F,
) -> Result<RotationHandle, RotationError>
where
    S: TokenSource + Send + 'static,
    F: FnMut(&IdentityCredential) + Send + 'static,
{
    let mut rotation = TokenRotation::new(interval)?;
    let token = rotation.start(&mut source)?.clone();
    let credential = IdentityCredential::issue(&profile, token, Timestamp::now());
    let countdown = Countdown::start(interval);

    tracing::info!(
        subject = %profile.id,
        token = credential.issued_token.short(),
        interval_ms = interval.as_millis() as u64,
        "credential rotation started"
    );
    if let Some(activity) = &activity {
        let mut log = activity.lock();
        log.record(format!("credential issued for {}", profile.id));
        log.record(format!("rotation started ({} ms)", interval.as_millis()));
    }

    let (credential_tx, credential_rx) = watch::channel(credential);
    let (countdown_tx, countdown_rx) = watch::channel(countdown);
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut countdown = countdown;
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break,
                _ = countdown.expired() => {}
            }

            let token = match rotation.rotate(&mut source) {
                Ok(token) => token.clone(),
                Err(err) => {
                    tracing::warn!(error = %err, "rotation halted");
                    break;
                }
            };
            let credential = IdentityCredential::issue(&profile, token, Timestamp::now());
            countdown = countdown.next();

            tracing::debug!(
                generation = rotation.generation(),
                token = credential.issued_token.short(),
                "credential rotated"
            );

            on_rotate(&credential);
            countdown_tx.send_replace(countdown);
            credential_tx.send_replace(credential);
        }

        if rotation.stop().is_ok() {
            tracing::info!(generation = rotation.generation(), "credential rotation stopped");
            if let Some(activity) = &activity {
                activity.lock().record(format!(
                    "rotation stopped after {} rotations",
                    rotation.generation()
                ));
            }
        }
    });

    Ok(RotationHandle {
        cancel: Some(cancel_tx),
        task: Some(task),
        credential: credential_rx,
        countdown: countdown_rx,
    })
}

impl RotationHandle {
    /// The credential for the current window.
    pub fn current(&self) -> IdentityCredential {
        self.credential.borrow().clone()
    }

    /// The countdown for the current window.
    pub fn countdown(&self) -> Countdown {
        *self.countdown.borrow()
    }

    /// Receiver notified on every rotation.
    pub fn subscribe(&self) -> watch::Receiver<IdentityCredential> {
        self.credential.clone()
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop rotating and wait for the task to exit.
    pub async fn stop(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!("rotation task panicked");
                }
            }
        }
    }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use clubpass_core::{RotationToken, SubjectId};
    use parking_lot::Mutex;

    use crate::activity::ActivityLog;

    const WINDOW: Duration = Duration::from_secs(20);

    fn make_profile() -> SubjectProfile {
        SubjectProfile::new("Ada", SubjectId::new("A0123").unwrap(), "ada@uni.edu").unwrap()
    }

    fn counter_tokens() -> impl FnMut() -> RotationToken + Send + 'static {
        let mut n = 0u32;
        move || {
            n += 1;
            RotationToken::from_string(format!("tok-{n}"))
        }
    }

    fn recorder() -> (
        Arc<Mutex<Vec<IdentityCredential>>>,
        impl FnMut(&IdentityCredential) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |c: &IdentityCredential| sink.lock().push(c.clone()))
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_credential_is_available() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        let current = handle.current();
        assert_eq!(current.issued_token.as_str(), "tok-1");
        assert_eq!(current.subject_name, "Ada");
        assert!(seen.lock().is_empty());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_k_windows_fire_k_rotations() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        settle().await;

        for _ in 0..5 {
            tokio::time::advance(WINDOW).await;
            settle().await;
        }

        let seen = seen.lock().clone();
        assert_eq!(seen.len(), 5);
        let tokens: HashSet<_> = seen.iter().map(|c| c.issued_token.clone()).collect();
        assert_eq!(tokens.len(), 5);
        for pair in seen.windows(2) {
            assert_ne!(pair[0].issued_token, pair[1].issued_token);
        }
        assert_eq!(handle.current(), seen[4]);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_rotation_before_full_window() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        settle().await;
        tokio::time::advance(WINDOW - Duration::from_millis(1)).await;
        settle().await;
        assert!(seen.lock().is_empty());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_rotations() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        settle().await;
        tokio::time::advance(WINDOW).await;
        settle().await;
        assert_eq!(seen.lock().len(), 1);

        handle.stop().await;
        for _ in 0..4 {
            tokio::time::advance(WINDOW).await;
            settle().await;
        }
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        drop(handle);
        for _ in 0..3 {
            tokio::time::advance(WINDOW).await;
            settle().await;
        }
        assert!(seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_begins_full_window() {
        let (seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        settle().await;
        tokio::time::advance(WINDOW / 2).await;
        handle.stop().await;

        let (seen_again, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        assert_eq!(handle.countdown().remaining(), WINDOW);
        settle().await;
        tokio::time::advance(WINDOW / 2).await;
        settle().await;
        assert!(seen_again.lock().is_empty());
        tokio::time::advance(WINDOW / 2).await;
        settle().await;
        assert_eq!(seen_again.lock().len(), 1);
        assert!(seen.lock().is_empty());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_follows_rotation() {
        let (_seen, on_rotate) = recorder();
        let handle = start_rotation(WINDOW, make_profile(), counter_tokens(), None, on_rotate).unwrap();
        let first = handle.countdown();
        settle().await;
        tokio::time::advance(WINDOW).await;
        settle().await;
        let second = handle.countdown();
        assert_eq!(second.deadline(), first.deadline() + WINDOW);
        assert_eq!(second.remaining(), WINDOW);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_records_issue_start_and_stop() {
        let activity = ActivityLog::new(16).shared();
        let (_seen, on_rotate) = recorder();
        let handle = start_rotation(
            WINDOW,
            make_profile(),
            counter_tokens(),
            Some(Arc::clone(&activity)),
            on_rotate,
        )
        .unwrap();
        settle().await;
        for _ in 0..2 {
            tokio::time::advance(WINDOW).await;
            settle().await;
        }
        handle.stop().await;

        let messages: Vec<String> = activity.lock().entries().map(|r| r.message.clone()).collect();
        assert_eq!(
            messages,
            [
                "rotation stopped after 2 rotations",
                "rotation started (20000 ms)",
                "credential issued for A0123",
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let err = start_rotation(Duration::ZERO, make_profile(), counter_tokens(), None, |_: &IdentityCredential| {})
            .unwrap_err();
        assert_eq!(err, RotationError::ZeroInterval);
    }
}
