//! # clubpass-api — Axum Check-In Service
//!
//! HTTP surface for events scanned by more than one staff device. The
//! in-process ledger of `clubpass-state` assumes a single scanner; this
//! service makes the per-event duplicate check and append one critical
//! section so concurrent devices cannot both admit the same guest.
//!
//! ## Routes
//!
//! - `/v1/events/*` — scan recording and guest lists
//! - `/v1/payloads/inspect` — payload labels without recording
//! - `/health/liveness` — liveness probe
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers — delegates to domain crates.
//! - All errors map to structured HTTP responses via `AppError`.
//! - Guest lists are in memory and lost on restart.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::checkin::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new().route("/health/liveness", axum::routing::get(liveness));

    Router::new().merge(health).merge(api)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "clubpass api listening");
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}

/// Liveness probe — the process is up.
async fn liveness() -> &'static str {
    "ok"
}
