//! Router setup with all API routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use triage_core::error::TriageError;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// How often idle sessions are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Create the axum Router with all routes and middleware.
///
/// `/health` and `/score` are public. Session routes require the bearer
/// token and share one per-second rate limiter.
pub fn create_router(state: AppState) -> Router {
    // Allow a local front end on the server port or the one after it.
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = [port, port.saturating_add(1)]
        .iter()
        .flat_map(|p| [format!("http://127.0.0.1:{}", p), format!("http://localhost:{}", p)])
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/score", post(handlers::score));

    let limiter = RateLimiter::new(state.config.server.rate_limit_per_sec);

    let session_routes = Router::new()
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/messages", post(handlers::post_message))
        .route("/sessions/{id}/diagnosis", post(handlers::request_diagnosis))
        .route("/sessions/{id}/restart", post(handlers::restart))
        .route("/sessions/{id}/report", get(handlers::report))
        .layer(axum::middleware::from_fn(
            crate::rate_limit::rate_limit_middleware,
        ))
        .layer(axum::Extension(limiter))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(session_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on 127.0.0.1 at the configured port.
///
/// Also spawns the idle-session sweeper for the lifetime of the server.
pub async fn start_server(state: AppState) -> Result<(), TriageError> {
    let addr = format!("127.0.0.1:{}", state.config.server.port);

    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let o = Arc::clone(&orchestrator);
            if let Err(e) = tokio::task::spawn_blocking(move || o.purge_expired()).await {
                tracing::warn!(error = %e, "Session sweep failed");
            }
        }
    });

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TriageError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| TriageError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
