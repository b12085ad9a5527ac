//! # Scan Session
//!
//! Connects a camera stream to a guest ledger for one event. The camera
//! decodes the code in view many times a second; the session's
//! [`ScanGate`] forwards one payload per arming and the staff member
//! dismisses the result to scan the next guest.
//!
//! A session runs either inline ([`ScanSession::on_payload()`]) or as a
//! task fed by an mpsc channel ([`ScanSession::spawn()`]). Closing a
//! spawned session waits for the task to exit, so no payload is recorded
//! after [`ScanSessionHandle::close()`] returns.

use std::sync::Arc;

use clubpass_core::{EventId, PayloadDigest};
use clubpass_state::{GateError, GateState, GuestScanLedger, ScanGate, ScanOutcome};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::activity::SharedActivityLog;

/// A ledger shared by the sessions of one device.
pub type SharedLedger = Arc<Mutex<GuestScanLedger>>;

/// Outcomes buffered between the session task and its consumer.
const OUTCOME_BUFFER: usize = 16;

/// One scanner view recording into a ledger for one event.
#[derive(Debug)]
pub struct ScanSession {
    event_id: EventId,
    ledger: SharedLedger,
    gate: ScanGate,
    last_result: Option<ScanOutcome>,
    activity: Option<SharedActivityLog>,
}

impl ScanSession {
    /// Open the scanner for `event_id`, armed for the first guest.
    pub fn open(event_id: EventId, ledger: SharedLedger) -> Self {
        let mut gate = ScanGate::new();
        gate.open();
        tracing::debug!(event = %event_id, "scan session opened");
        Self {
            event_id,
            ledger,
            gate,
            last_result: None,
            activity: None,
        }
    }

    /// Also record outcomes into an activity history.
    pub fn with_activity(mut self, activity: SharedActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Handle one camera delivery.
    ///
    /// Returns the outcome when the gate captured the payload, `None` when
    /// it was dropped.
    pub fn on_payload(&mut self, raw: &str) -> Option<ScanOutcome> {
        let Some(payload) = self.gate.offer(raw) else {
            tracing::trace!(event = %self.event_id, state = %self.gate.state(), "delivery dropped");
            return None;
        };

        let outcome = match self.ledger.lock().record_scan(self.event_id.as_str(), payload) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(event = %self.event_id, error = %err, "scan not recorded");
                ScanOutcome::Ignored
            }
        };

        if let Some(activity) = &self.activity {
            let digest = PayloadDigest::of(payload);
            activity.lock().record(format!(
                "scan {} at {} ({})",
                outcome.as_str(),
                self.event_id,
                digest.short()
            ));
        }

        self.last_result = Some(outcome.clone());
        Some(outcome)
    }

    /// Acknowledge the last result and re-arm.
    pub fn dismiss(&mut self) -> Result<(), GateError> {
        self.gate.dismiss()?;
        self.last_result = None;
        Ok(())
    }

    /// Show the scanner again: clears the last result and re-arms.
    pub fn reopen(&mut self) {
        self.last_result = None;
        self.gate.open();
    }

    /// Hide the scanner. Further deliveries are dropped.
    pub fn close(&mut self) {
        self.gate.close();
        tracing::debug!(event = %self.event_id, dropped = self.gate.dropped(), "scan session closed");
    }

    /// Result awaiting dismissal.
    pub fn last_result(&self) -> Option<&ScanOutcome> {
        self.last_result.as_ref()
    }

    /// Event being scanned.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Gate state.
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Deliveries dropped since the scanner was opened.
    pub fn dropped(&self) -> u64 {
        self.gate.dropped()
    }

    /// Run the session on a task fed by `camera`.
    ///
    /// The task ends when the camera stream ends or the handle is closed.
    pub fn spawn(self, camera: mpsc::Receiver<String>) -> ScanSessionHandle {
        let (command_tx, command_rx) = mpsc::channel(4);
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_BUFFER);
        let task = tokio::spawn(run_session(self, camera, command_rx, outcome_tx));
        ScanSessionHandle {
            commands: Some(command_tx),
            outcomes: outcome_rx,
            task: Some(task),
        }
    }
}

// ─── Spawned Session ─────────────────────────────────────────────────

#[derive(Debug)]
enum Command {
    Dismiss(oneshot::Sender<Result<(), GateError>>),
}

async fn run_session(
    mut session: ScanSession,
    mut camera: mpsc::Receiver<String>,
    mut commands: mpsc::Receiver<Command>,
    outcomes: mpsc::Sender<ScanOutcome>,
) -> ScanSession {
    loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Dismiss(reply)) => {
                    let _ = reply.send(session.dismiss());
                }
                None => break,
            },
            payload = camera.recv() => match payload {
                Some(payload) => {
                    if let Some(outcome) = session.on_payload(&payload) {
                        if outcomes.send(outcome).await.is_err() {
                            break;
                        }
                    }
                }
                None => break,
            },
        }
    }
    session.close();
    session
}

/// Owner of a spawned [`ScanSession`].
#[derive(Debug)]
pub struct ScanSessionHandle {
    commands: Option<mpsc::Sender<Command>>,
    outcomes: mpsc::Receiver<ScanOutcome>,
    task: Option<JoinHandle<ScanSession>>,
}

impl ScanSessionHandle {
    /// Next captured outcome; `None` once the session has ended.
    pub async fn next_outcome(&mut self) -> Option<ScanOutcome> {
        self.outcomes.recv().await
    }

    /// Dismiss the current result so the next guest can be scanned.
    pub async fn dismiss(&self) -> Result<(), GateError> {
        let ended = GateError::NotCaptured {
            state: GateState::Closed,
        };
        let Some(commands) = &self.commands else {
            return Err(ended);
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        if commands.send(Command::Dismiss(reply_tx)).await.is_err() {
            return Err(ended);
        }
        reply_rx.await.unwrap_or(Err(ended))
    }

    /// Close the scanner and wait for the task to exit.
    ///
    /// Returns the closed session, or `None` if the task panicked.
    pub async fn close(mut self) -> Option<ScanSession> {
        self.commands.take();
        self.outcomes.close();
        let task = self.task.take()?;
        match task.await {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::error!(error = %err, "scan session task failed");
                None
            }
        }
    }
}

impl Drop for ScanSessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
