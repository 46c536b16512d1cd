//! Conversation context and the turn-processing engine.
//!
//! A [`Conversation`] owns every piece of per-dialogue state. The
//! [`DialogEngine`] is stateless apart from configuration and runs one turn
//! at a time against a conversation passed in by the caller:
//!
//! resolver -> extractor + topics -> policy -> (phrasing adapter) -> commit

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_core::config::{DialogConfig, TriageConfig};
use triage_core::types::{
    join_contents, Consent, Diagnosis, Entities, Message, PatientProfile, Role, Topics,
};

use crate::diagnosis::Diagnoser;
use crate::error::DialogError;
use crate::extractor::EntityExtractor;
use crate::phrasing::{PhrasingAdapter, PhrasingRequest, RemotePhrasingAdapter};
use crate::policy::{infer_choices, Branch, Decision, FollowUpPolicy, TERMINATION_TEXT};
use crate::report::TriageReport;
use crate::resolver::YesNoResolver;
use crate::slots::{SlotStore, Slots};
use crate::topics::TopicDetector;

/// Opening assistant message of a new conversation.
pub const GREETING: &str = "지금 어디가 가장 불편하신가요?";
/// Opening assistant message after a restart.
pub const RESTART_GREETING: &str = "안녕하세요. 다시 답변해주세요.";
/// Appended once when diagnosis starts automatically.
pub const DIAGNOSIS_BANNER: &str = TERMINATION_TEXT;

const TERMINATION_MARKER: &str = "진단을 진행하겠습니다";
const STRONG_SIGNALS: &[&str] = &["가슴", "통증", "숨", "식은땀"];

const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];
const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '·', '•', '–', '—', '-', '_', '|', '*', '~', '\'', '"', '(', ')', '[',
    ']', '{', '}', '!', '?',
];

/// Normalise an utterance, or `None` when it carries no content.
///
/// Non-breaking spaces become spaces, zero-width characters are dropped and
/// input made only of punctuation counts as empty.
pub fn clean_utterance(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    let has_content = cleaned
        .chars()
        .any(|c| !c.is_whitespace() && !PUNCTUATION.contains(&c));
    has_content.then(|| cleaned.to_string())
}

// =============================================================================
// Conversation
// =============================================================================

/// The question awaiting an answer, with its quick replies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub question: String,
    pub choices: Vec<String>,
}

/// All state of one dialogue.
#[derive(Clone, Debug, Serialize)]
pub struct Conversation {
    id: Uuid,
    profile: PatientProfile,
    consent: Consent,
    transcript: Vec<Message>,
    store: SlotStore,
    pending: Option<PendingQuestion>,
    qa_pairs: u32,
    ready_to_diagnose: bool,
    banner_shown: bool,
    diagnosis: Option<Diagnosis>,
    started_at: i64,
    last_active_at: i64,
}

impl Conversation {
    fn new(profile: PatientProfile, consent: Consent) -> Self {
        let now = Local::now().timestamp();
        Self {
            id: Uuid::new_v4(),
            profile,
            consent,
            transcript: vec![Message::assistant(GREETING)],
            store: SlotStore::new(),
            pending: None,
            qa_pairs: 0,
            ready_to_diagnose: false,
            banner_shown: false,
            diagnosis: None,
            started_at: now,
            last_active_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    pub fn consent(&self) -> &Consent {
        &self.consent
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn slots(&self) -> &Slots {
        self.store.slots()
    }

    pub fn pending(&self) -> Option<&PendingQuestion> {
        self.pending.as_ref()
    }

    /// Emitted assistant messages that contained a question mark.
    pub fn qa_pairs(&self) -> u32 {
        self.qa_pairs
    }

    pub fn is_ready(&self) -> bool {
        self.ready_to_diagnose
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnosis.as_ref()
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn last_active_at(&self) -> i64 {
        self.last_active_at
    }

    fn touch(&mut self) {
        self.last_active_at = Local::now().timestamp();
    }
}

// =============================================================================
// TurnOutcome
// =============================================================================

/// Where the emitted question text came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Policy,
    Adapter,
}

/// Result of one accepted user turn.
#[derive(Clone, Debug, Serialize)]
pub struct TurnOutcome {
    pub question: String,
    pub choices: Vec<String>,
    pub source: QuestionSource,
    pub branch: Branch,
    /// How the user's text resolved against the previous question, if at all.
    pub answer: Option<bool>,
    pub entities: Entities,
    pub topics: Topics,
    pub qa_pairs: u32,
    pub ready_to_diagnose: bool,
    /// Set when this turn triggered the automatic diagnosis.
    pub diagnosis: Option<Diagnosis>,
}

// =============================================================================
// DialogEngine
// =============================================================================

/// Runs dialogue turns, diagnosis and restarts against a [`Conversation`].
pub struct DialogEngine {
    config: DialogConfig,
    extractor: EntityExtractor,
    topics: TopicDetector,
    resolver: YesNoResolver,
    policy: FollowUpPolicy,
    diagnoser: Diagnoser,
    adapter: Option<Arc<dyn PhrasingAdapter>>,
}

impl DialogEngine {
    pub fn new(config: DialogConfig) -> Self {
        Self {
            topics: TopicDetector::new(config.recent_window),
            config,
            extractor: EntityExtractor::new(),
            resolver: YesNoResolver::new(),
            policy: FollowUpPolicy::new(),
            diagnoser: Diagnoser::new(),
            adapter: None,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PhrasingAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Build an engine, attaching the remote phrasing adapter when enabled.
    ///
    /// An adapter that cannot be constructed is logged and left out.
    pub fn from_config(config: &TriageConfig) -> Self {
        let engine = Self::new(config.dialog.clone());
        if !config.phrasing.enabled {
            return engine;
        }
        match RemotePhrasingAdapter::new(config.phrasing.clone()) {
            Ok(adapter) => {
                tracing::info!(
                    endpoint = %config.phrasing.endpoint,
                    model = %config.phrasing.model,
                    "Remote phrasing adapter enabled"
                );
                engine.with_adapter(Arc::new(adapter))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Phrasing adapter unavailable; using policy questions only");
                engine
            }
        }
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Open a conversation. Privacy consent and a valid age are required.
    pub fn start(
        &self,
        profile: PatientProfile,
        consent: Consent,
    ) -> Result<Conversation, DialogError> {
        if !consent.privacy {
            return Err(DialogError::ConsentRequired);
        }
        if !PatientProfile::is_valid_age(profile.age) {
            return Err(DialogError::InvalidAge(profile.age));
        }
        let conversation = Conversation::new(profile, consent);
        tracing::info!(session_id = %conversation.id, "Conversation started");
        Ok(conversation)
    }

    /// Process one user utterance.
    ///
    /// Returns `Ok(None)` for input without content; nothing is recorded.
    pub fn submit(
        &self,
        conv: &mut Conversation,
        utterance: &str,
    ) -> Result<Option<TurnOutcome>, DialogError> {
        if conv.diagnosis.is_some() {
            return Err(DialogError::Finished);
        }
        let Some(text) = clean_utterance(utterance) else {
            tracing::debug!(session_id = %conv.id, "Ignoring input without content");
            return Ok(None);
        };
        conv.touch();

        // Quick replies are consumed by this turn whatever the answer says.
        let answer = conv.pending.take().and_then(|pending| {
            self.resolver
                .apply(&pending.question, &text, &mut conv.store)
                .map(|r| r.answer)
        });

        conv.transcript.push(Message::user(text.clone()));
        let topics = self.topics.detect_in_window(&conv.transcript, &text);

        let entities = self.extractor.extract(&text);
        conv.store.absorb_entities(&entities);

        let decision = self.policy.decide(&entities, &topics, &conv.store);
        let request = PhrasingRequest {
            entities: &entities,
            topics: &topics,
            slots: conv.store.slots(),
            utterance: &text,
        };
        let (question, choices, source) = self.phrase(&decision, &request);

        self.commit(conv, &decision, &question, &choices);

        tracing::debug!(
            session_id = %conv.id,
            branch = ?decision.branch,
            ?source,
            qa_pairs = conv.qa_pairs,
            ready = conv.ready_to_diagnose,
            "Turn processed"
        );

        let diagnosis = self.maybe_auto_diagnose(conv);

        Ok(Some(TurnOutcome {
            question,
            choices,
            source,
            branch: decision.branch,
            answer,
            entities,
            topics,
            qa_pairs: conv.qa_pairs,
            ready_to_diagnose: conv.ready_to_diagnose,
            diagnosis,
        }))
    }

    /// Run diagnosis if the conversation is ready or hit the pair ceiling.
    ///
    /// Returns the diagnosis only when it ran during this call.
    pub fn maybe_auto_diagnose(&self, conv: &mut Conversation) -> Option<Diagnosis> {
        if conv.diagnosis.is_some() {
            return None;
        }
        if !conv.ready_to_diagnose && conv.qa_pairs < self.config.auto_diagnose_pairs {
            return None;
        }

        if !conv.banner_shown {
            let already_said = conv
                .transcript
                .last()
                .is_some_and(|m| m.role == Role::Assistant && m.content == DIAGNOSIS_BANNER);
            if !already_said {
                conv.transcript.push(Message::assistant(DIAGNOSIS_BANNER));
            }
            conv.banner_shown = true;
        }

        Some(self.run_diagnosis(conv))
    }

    /// Whether the explicit diagnosis action is available.
    pub fn can_request_diagnosis(&self, conv: &Conversation) -> bool {
        conv.ready_to_diagnose || conv.qa_pairs >= self.config.manual_diagnose_pairs
    }

    /// Explicit diagnosis request. Re-running replaces the previous result.
    pub fn request_diagnosis(&self, conv: &mut Conversation) -> Result<Diagnosis, DialogError> {
        if !self.can_request_diagnosis(conv) {
            return Err(DialogError::DiagnosisUnavailable {
                pairs: conv.qa_pairs,
                required: self.config.manual_diagnose_pairs,
            });
        }
        conv.touch();
        Ok(self.run_diagnosis(conv))
    }

    /// Start the dialogue over. Profile and consent are kept.
    pub fn restart(&self, conv: &mut Conversation) {
        conv.transcript = vec![Message::assistant(RESTART_GREETING)];
        conv.store.reset();
        conv.pending = None;
        conv.qa_pairs = 0;
        conv.ready_to_diagnose = false;
        conv.banner_shown = false;
        conv.diagnosis = None;
        conv.touch();
        tracing::info!(session_id = %conv.id, "Conversation restarted");
    }

    pub fn report(
        &self,
        conv: &Conversation,
        now: DateTime<Local>,
    ) -> Result<TriageReport, DialogError> {
        let diagnosis = conv.diagnosis.as_ref().ok_or(DialogError::NoDiagnosis)?;
        Ok(TriageReport::build(diagnosis, &conv.profile, now))
    }

    // -- Private helpers --

    /// Ask the adapter for wording, falling back to the policy's own text.
    ///
    /// Terminal decisions never reach the adapter.
    fn phrase(
        &self,
        decision: &Decision,
        request: &PhrasingRequest<'_>,
    ) -> (String, Vec<String>, QuestionSource) {
        if let (false, Some(adapter)) = (decision.ready_to_diagnose, &self.adapter) {
            match adapter.phrase(request) {
                Ok(phrased) if !phrased.question.trim().is_empty() => {
                    let question = phrased.question.trim().to_string();
                    let choices = if phrased.choices.is_empty() {
                        infer_choices(&question)
                    } else {
                        phrased.choices
                    };
                    return (question, choices, QuestionSource::Adapter);
                }
                Ok(_) => tracing::warn!("Phrasing adapter returned a blank question; using policy text"),
                Err(e) => tracing::warn!(error = %e, "Phrasing adapter failed; using policy text"),
            }
        }
        (
            decision.question.clone(),
            decision.choices.clone(),
            QuestionSource::Policy,
        )
    }

    /// Apply an emitted question to the conversation state.
    fn commit(
        &self,
        conv: &mut Conversation,
        decision: &Decision,
        question: &str,
        choices: &[String],
    ) {
        if let Some(canonical) = decision.canonical {
            conv.store.mark_asked(canonical);
        }
        conv.store.mark_asked_by_text(question);
        if !decision.ready_to_diagnose {
            conv.store.log_question(question);
        }

        conv.transcript.push(Message::assistant(question));
        if question.contains('?') {
            conv.qa_pairs += 1;
        }
        conv.pending = question.trim_end().ends_with('?').then(|| PendingQuestion {
            question: question.to_string(),
            choices: choices.to_vec(),
        });

        if decision.ready_to_diagnose || question.contains(TERMINATION_MARKER) {
            conv.ready_to_diagnose = true;
        }
        if !conv.ready_to_diagnose && self.has_strong_signal(conv) {
            tracing::info!(session_id = %conv.id, "Strong signal detected; stopping early");
            conv.ready_to_diagnose = true;
        }
    }

    /// Chest, pain, breath and cold sweat all mentioned in the recent window.
    fn has_strong_signal(&self, conv: &Conversation) -> bool {
        let start = conv
            .transcript
            .len()
            .saturating_sub(self.config.strong_signal_window);
        let recent = join_contents(&conv.transcript[start..]);
        STRONG_SIGNALS.iter().all(|s| recent.contains(s))
    }

    fn run_diagnosis(&self, conv: &mut Conversation) -> Diagnosis {
        conv.pending = None;
        let diagnosis = self.diagnoser.diagnose(&conv.transcript, &conv.consent);
        conv.diagnosis = Some(diagnosis.clone());
        diagnosis
    }
}
