//! Session orchestrator: many independent conversations keyed by id.
//!
//! Each conversation sits behind its own mutex so one slow turn (a remote
//! phrasing call) never blocks other sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, TryLockError};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use uuid::Uuid;

use triage_core::types::{Consent, Diagnosis, Message, PatientProfile};

use crate::conversation::{Conversation, DialogEngine, TurnOutcome};
use crate::error::DialogError;
use crate::report::TriageReport;
use crate::slots::{CanonicalQuestion, Slots};

/// Snapshot of one conversation for callers outside the engine.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub profile: PatientProfile,
    pub consent: Consent,
    pub transcript: Vec<Message>,
    pub pending_question: Option<String>,
    pub choices: Vec<String>,
    pub qa_pairs: u32,
    pub ready_to_diagnose: bool,
    pub can_request_diagnosis: bool,
    pub slots: Slots,
    pub asked_questions: Vec<CanonicalQuestion>,
    pub diagnosis: Option<Diagnosis>,
    pub started_at: String,
    pub last_active_at: String,
}

/// Short listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_active_at: String,
    pub message_count: usize,
    pub diagnosed: bool,
}

/// Reply to a submitted message.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    /// False when the input had no content and was ignored.
    pub accepted: bool,
    pub turn: Option<TurnOutcome>,
    pub session: SessionView,
}

type SharedConversation = Arc<Mutex<Conversation>>;

pub struct TriageOrchestrator {
    engine: DialogEngine,
    sessions: Mutex<HashMap<Uuid, SharedConversation>>,
}

impl TriageOrchestrator {
    pub fn new(engine: DialogEngine) -> Self {
        Self {
            engine,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &DialogEngine {
        &self.engine
    }

    pub fn create_session(
        &self,
        profile: PatientProfile,
        consent: Consent,
    ) -> Result<SessionView, DialogError> {
        let conversation = self.engine.start(profile, consent)?;
        let view = self.view(&conversation);
        self.lock_sessions()?
            .insert(conversation.id(), Arc::new(Mutex::new(conversation)));
        Ok(view)
    }

    pub fn get_session(&self, id: Uuid) -> Result<SessionView, DialogError> {
        self.with_conversation(id, |conv| Ok(self.view(conv)))
    }

    /// Number of live sessions. Reads the map only.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Summaries of every idle session.
    ///
    /// A conversation that is mid-turn is skipped rather than waited on.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<SharedConversation> = match self.sessions.lock() {
            Ok(s) => s.values().cloned().collect(),
            Err(_) => return vec![],
        };
        handles
            .iter()
            .filter_map(|h| h.try_lock().ok().map(|conv| summarize(&conv)))
            .collect()
    }

    pub fn delete_session(&self, id: Uuid) -> Result<(), DialogError> {
        if self.lock_sessions()?.remove(&id).is_some() {
            tracing::info!(session_id = %id, "Session deleted");
            Ok(())
        } else {
            Err(DialogError::SessionNotFound(id))
        }
    }

    pub fn handle_message(&self, id: Uuid, text: &str) -> Result<TurnReply, DialogError> {
        self.with_conversation(id, |conv| {
            let turn = self.engine.submit(conv, text)?;
            Ok(TurnReply {
                accepted: turn.is_some(),
                turn,
                session: self.view(conv),
            })
        })
    }

    pub fn request_diagnosis(&self, id: Uuid) -> Result<Diagnosis, DialogError> {
        self.with_conversation(id, |conv| self.engine.request_diagnosis(conv))
    }

    pub fn restart(&self, id: Uuid) -> Result<SessionView, DialogError> {
        self.with_conversation(id, |conv| {
            self.engine.restart(conv);
            Ok(self.view(conv))
        })
    }

    pub fn report(&self, id: Uuid) -> Result<TriageReport, DialogError> {
        self.with_conversation(id, |conv| self.engine.report(conv, Local::now()))
    }

    /// Drop every session idle past the configured timeout.
    ///
    /// A conversation that is mid-turn is active and always kept; a
    /// poisoned one is dropped.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.lock() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(conv) => !self.is_expired(&conv),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "Expired sessions purged");
        }
        removed
    }

    pub fn is_expired(&self, conv: &Conversation) -> bool {
        let now = Local::now().timestamp();
        let timeout_secs = i64::from(self.engine.config().session_timeout_minutes) * 60;
        now - conv.last_active_at() > timeout_secs
    }

    // -- Private helpers --

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SharedConversation>>, DialogError> {
        self.sessions
            .lock()
            .map_err(|e| DialogError::StateLock(format!("session map lock poisoned: {}", e)))
    }

    /// Run `f` with exclusive access to one live conversation.
    ///
    /// The map lock is released before the conversation lock is taken.
    fn with_conversation<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Conversation) -> Result<T, DialogError>,
    ) -> Result<T, DialogError> {
        let handle = self
            .lock_sessions()?
            .get(&id)
            .cloned()
            .ok_or(DialogError::SessionNotFound(id))?;

        let mut conv = handle
            .lock()
            .map_err(|e| DialogError::StateLock(format!("conversation lock poisoned: {}", e)))?;

        if self.is_expired(&conv) {
            drop(conv);
            self.lock_sessions()?.remove(&id);
            tracing::info!(session_id = %id, "Session expired");
            return Err(DialogError::SessionNotFound(id));
        }

        f(&mut *conv)
    }

    fn view(&self, conv: &Conversation) -> SessionView {
        let pending = conv.pending();
        SessionView {
            id: conv.id(),
            profile: conv.profile().clone(),
            consent: *conv.consent(),
            transcript: conv.transcript().to_vec(),
            pending_question: pending.map(|p| p.question.clone()),
            choices: pending.map(|p| p.choices.clone()).unwrap_or_default(),
            qa_pairs: conv.qa_pairs(),
            ready_to_diagnose: conv.is_ready(),
            can_request_diagnosis: self.engine.can_request_diagnosis(conv),
            slots: conv.slots().clone(),
            asked_questions: conv.store().asked_questions(),
            diagnosis: conv.diagnosis().cloned(),
            started_at: format_epoch(conv.started_at()),
            last_active_at: format_epoch(conv.last_active_at()),
        }
    }
}

fn summarize(conv: &Conversation) -> SessionSummary {
    SessionSummary {
        id: conv.id(),
        started_at: format_epoch(conv.started_at()),
        last_active_at: format_epoch(conv.last_active_at()),
        message_count: conv.transcript().len(),
        diagnosed: conv.diagnosis().is_some(),
    }
}

/// Format epoch seconds as an RFC 3339 string.
fn format_epoch(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}
