//! End-to-end: a holder's rotating credential is shown, scanned at the
//! door, and checked into the event's guest list.

use std::sync::Arc;
use std::time::Duration;

use clubpass_core::{codec, EventId, IdentityCredential};
use clubpass_runtime::{
    open_credential, ActivityLog, RawProfile, ScanSession, SessionContext, SharedLedger,
    StaticProfileSource,
};
use clubpass_state::{FreshnessPolicy, GuestScanLedger, RandomTokens, ScanOutcome};
use parking_lot::Mutex;
use tokio::sync::mpsc;

const WINDOW: Duration = Duration::from_secs(20);

fn make_profiles() -> StaticProfileSource {
    let mut source = StaticProfileSource::new();
    source.insert(
        "ada-session",
        RawProfile {
            name: Some("Ada Lovelace".to_string()),
            id: Some("A0123".to_string()),
            contact: Some("ada@uni.edu".to_string()),
        },
    );
    source
}

fn make_ledger(policy: FreshnessPolicy) -> SharedLedger {
    Arc::new(Mutex::new(GuestScanLedger::with_policy(policy)))
}

#[tokio::test(start_paused = true)]
async fn test_rotated_credentials_check_in_once() {
    let rotated = Arc::new(Mutex::new(Vec::<IdentityCredential>::new()));
    let sink = Arc::clone(&rotated);
    let display = open_credential(
        &make_profiles(),
        &SessionContext::new("ada-session"),
        WINDOW,
        RandomTokens,
        None,
        move |credential: &IdentityCredential| sink.lock().push(credential.clone()),
    )
    .await
    .unwrap();

    let first = codec::encode(&display.current()).unwrap();

    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(WINDOW).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    let second = codec::encode(&display.current()).unwrap();
    assert_ne!(first, second);
    assert_eq!(rotated.lock().len(), 1);
    display.stop().await;

    let ledger = make_ledger(FreshnessPolicy::disabled());
    let activity = ActivityLog::new(50).shared();
    let (camera, frames) = mpsc::channel(8);
    let mut scanner = ScanSession::open(EventId::new("welcome-week").unwrap(), Arc::clone(&ledger))
        .with_activity(Arc::clone(&activity))
        .spawn(frames);

    camera.send(first.clone()).await.unwrap();
    let outcome = scanner.next_outcome().await.unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Accepted {
            label: "Name: Ada Lovelace • ID: A0123 • Email: ada@uni.edu".to_string()
        }
    );

    // Same holder, next window: the label matches, so it is a duplicate.
    scanner.dismiss().await.unwrap();
    camera.send(second).await.unwrap();
    let outcome = scanner.next_outcome().await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Duplicate { .. }));

    scanner.close().await.unwrap();

    let guests = ledger.lock().guest_list("welcome-week").to_vec();
    assert_eq!(guests.len(), 1);
    assert_eq!(guests[0].raw_payload, first);
    assert_eq!(activity.lock().len(), 2);
}

#[tokio::test]
async fn test_stale_credential_rejected_when_policy_enabled() {
    let display = open_credential(
        &make_profiles(),
        &SessionContext::new("ada-session"),
        WINDOW,
        RandomTokens,
        None,
        |_: &IdentityCredential| {},
    )
    .await
    .unwrap();
    let credential = display.current();
    display.stop().await;

    let payload = codec::encode(&credential).unwrap();
    let mut ledger = GuestScanLedger::with_policy(FreshnessPolicy::max_age(WINDOW));

    let later = clubpass_core::Timestamp::from_epoch_millis(
        credential.issued_at.epoch_millis() + 60_000,
    )
    .unwrap();
    let outcome = ledger.record_scan_at("welcome-week", &payload, later).unwrap();
    assert!(matches!(outcome, ScanOutcome::Stale { age_ms: Some(60_000), .. }));
    assert!(ledger.guest_list("welcome-week").is_empty());

    let outcome = ledger
        .record_scan_at("welcome-week", &payload, credential.issued_at)
        .unwrap();
    assert!(outcome.accepted());
}

#[tokio::test]
async fn test_same_credential_at_two_events() {
    let display = open_credential(
        &make_profiles(),
        &SessionContext::new("ada-session"),
        WINDOW,
        RandomTokens,
        None,
        |_: &IdentityCredential| {},
    )
    .await
    .unwrap();
    let payload = codec::encode(&display.current()).unwrap();
    display.stop().await;

    let ledger = make_ledger(FreshnessPolicy::disabled());
    for event in ["welcome-week", "hackathon"] {
        let mut session = ScanSession::open(EventId::new(event).unwrap(), Arc::clone(&ledger));
        assert!(session.on_payload(&payload).unwrap().accepted());
    }
    let ledger = ledger.lock();
    assert_eq!(ledger.guest_list("welcome-week").len(), 1);
    assert_eq!(ledger.guest_list("hackathon").len(), 1);
}

#[tokio::test]
async fn test_incomplete_profile_issues_nothing() {
    let mut source = make_profiles();
    source.insert(
        "no-email",
        RawProfile {
            name: Some("Bob".to_string()),
            id: Some("B0456".to_string()),
            contact: None,
        },
    );
    let activity = ActivityLog::new(10).shared();
    let result = open_credential(
        &source,
        &SessionContext::new("no-email"),
        WINDOW,
        RandomTokens,
        Some(Arc::clone(&activity)),
        |_: &IdentityCredential| {},
    )
    .await;
    assert!(result.is_err());
    assert!(activity.lock().is_empty());
}
