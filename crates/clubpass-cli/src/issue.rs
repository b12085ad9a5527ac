//! # Issue Subcommand
//!
//! Shows a holder's rotating credential. Prints the payload of the current
//! window, then each rotated payload as its window opens, one per line.
//! Profiles come from a YAML file keyed by session id.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use clubpass_core::{codec, IdentityCredential};
use clubpass_runtime::{
    open_credential, ClubpassConfig, SessionContext, SharedActivityLog, StaticProfileSource,
};
use clubpass_state::{ClockTokens, RandomTokens, TokenSource};
use tokio::sync::mpsc;

/// How rotation tokens are generated.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Random UUIDs.
    Random,
    /// Wall-clock milliseconds.
    Clock,
}

/// Arguments for the `clubpass issue` subcommand.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// YAML file mapping session ids to profiles.
    #[arg(long)]
    pub profiles: PathBuf,

    /// Session to issue for.
    #[arg(long)]
    pub session: String,

    /// Rotations to wait for after the first payload.
    #[arg(long, default_value_t = 0)]
    pub rotations: u32,

    /// Override the configured rotation interval.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Token generator.
    #[arg(long, value_enum, default_value = "random")]
    pub tokens: TokenKind,
}

/// Execute the issue subcommand.
pub fn run_issue(args: &IssueArgs, config: &ClubpassConfig) -> Result<u8> {
    let text = std::fs::read_to_string(&args.profiles)
        .with_context(|| format!("failed to read profiles {}", args.profiles.display()))?;
    let source = StaticProfileSource::from_yaml(&text)
        .with_context(|| format!("failed to parse profiles {}", args.profiles.display()))?;
    let interval = Duration::from_millis(args.interval_ms.unwrap_or(config.rotation_interval_ms));
    let session = SessionContext::new(&args.session);

    let activity = crate::open_activity(config);
    let shown = crate::runtime()?.block_on(async {
        match args.tokens {
            TokenKind::Random => {
                show(&source, &session, interval, RandomTokens, &activity, args.rotations).await
            }
            TokenKind::Clock => {
                let tokens = ClockTokens::default();
                show(&source, &session, interval, tokens, &activity, args.rotations).await
            }
        }
    });

    if shown.is_err() {
        activity
            .lock()
            .record(format!("credential not issued for session {}", args.session));
    }
    crate::flush_activity(&activity);
    let shown = shown?;
    tracing::debug!(session = %args.session, payloads = shown, "credential shown");
    Ok(0)
}

/// Print the current payload and `rotations` rotated ones. Returns the
/// number printed.
async fn show<S>(
    source: &StaticProfileSource,
    session: &SessionContext,
    interval: Duration,
    tokens: S,
    activity: &SharedActivityLog,
    rotations: u32,
) -> Result<u32>
where
    S: TokenSource + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<IdentityCredential>();
    let activity = Some(Arc::clone(activity));
    let display = open_credential(source, session, interval, tokens, activity, move |credential| {
        let _ = tx.send(credential.clone());
    })
    .await
    .context("cannot show credential")?;

    println!("{}", codec::encode(&display.current())?);
    let mut printed = 1;
    for _ in 0..rotations {
        let Some(credential) = rx.recv().await else {
            break;
        };
        println!("{}", codec::encode(&credential)?);
        printed += 1;
    }
    display.stop().await;
    Ok(printed)
}
