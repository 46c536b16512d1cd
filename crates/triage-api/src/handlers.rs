//! Route handler functions for all API endpoints.
//!
//! Dialogue work runs on the blocking pool: a turn may wait on the remote
//! phrasing endpoint, which uses a blocking HTTP client.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_core::types::{join_contents, Consent, Message, PatientProfile, TriageLevel};
use triage_dialog::{
    DialogError, SessionSummary, SessionView, SummaryGenerator, TriageOrchestrator, TriageReport,
    TriageScorer, TurnReply,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub phrasing_enabled: bool,
}

/// Request body for POST /sessions.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub profile: PatientProfile,
    #[serde(default)]
    pub consent: Consent,
}

/// Request body for POST /sessions/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Request body for POST /score. Either a transcript or free text.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub transcript: Vec<Message>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub risk_score: u32,
    pub triage_level: TriageLevel,
    pub label: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: Uuid,
}

/// Run an orchestrator call on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TriageOrchestrator) -> Result<T, DialogError> + Send + 'static,
{
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::task::spawn_blocking(move || f(&orchestrator))
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

// =============================================================================
// Public endpoints
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.session_count(),
        phrasing_enabled: state.orchestrator.engine().has_adapter(),
    })
}

/// POST /score - score an arbitrary transcript without a session.
pub async fn score(Json(body): Json<ScoreRequest>) -> Result<Json<ScoreResponse>, ApiError> {
    let text = match body.text {
        Some(text) if !text.trim().is_empty() => text,
        _ if !body.transcript.is_empty() => join_contents(&body.transcript),
        _ => {
            return Err(ApiError::BadRequest(
                "either 'transcript' or 'text' is required".to_string(),
            ))
        }
    };

    let assessment = TriageScorer::new().assess_text(&text);
    let summary = SummaryGenerator::new().summarize_text(&text);
    tracing::debug!(
        score = assessment.score,
        triage_level = %assessment.level,
        "Scored ad-hoc transcript"
    );

    Ok(Json(ScoreResponse {
        risk_score: assessment.score,
        triage_level: assessment.level,
        label: assessment.level.label().to_string(),
        summary,
    }))
}

// =============================================================================
// Session endpoints
// =============================================================================

/// GET /sessions - list live sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    run_blocking(&state, |o| Ok(o.list_sessions())).await.map(Json)
}

/// POST /sessions - start a conversation.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = run_blocking(&state, move |o| o.create_session(body.profile, body.consent)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    run_blocking(&state, move |o| o.get_session(id)).await.map(Json)
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    run_blocking(&state, move |o| o.delete_session(id)).await?;
    Ok(Json(DeleteResponse { deleted: id }))
}

/// POST /sessions/{id}/messages - submit one user utterance.
///
/// A blank or punctuation-only utterance is accepted with `accepted: false`
/// and leaves the conversation untouched.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    run_blocking(&state, move |o| o.handle_message(id, &body.text))
        .await
        .map(Json)
}

/// POST /sessions/{id}/diagnosis - explicit diagnosis request.
pub async fn request_diagnosis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    run_blocking(&state, move |o| {
        o.request_diagnosis(id)?;
        o.get_session(id)
    })
    .await
    .map(Json)
}

/// POST /sessions/{id}/restart
pub async fn restart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    run_blocking(&state, move |o| o.restart(id)).await.map(Json)
}

/// GET /sessions/{id}/report
pub async fn report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TriageReport>, ApiError> {
    run_blocking(&state, move |o| o.report(id)).await.map(Json)
}
