//! Dialogue engine for the triage assistant.
//!
//! Extracts clinical signals from each utterance, tracks what has been asked
//! and answered, picks the next follow-up question and, once enough signal is
//! gathered, scores the transcript into a triage recommendation.

pub mod conversation;
pub mod diagnosis;
pub mod error;
pub mod extractor;
pub mod hospitals;
pub mod keywords;
pub mod orchestrator;
pub mod phrasing;
pub mod policy;
pub mod report;
pub mod resolver;
pub mod scorer;
pub mod slots;
pub mod summary;
pub mod topics;

pub use conversation::{Conversation, DialogEngine, PendingQuestion, QuestionSource, TurnOutcome};
pub use diagnosis::Diagnoser;
pub use error::{DialogError, PhrasingError};
pub use extractor::EntityExtractor;
pub use hospitals::HospitalDirectory;
pub use orchestrator::{SessionSummary, SessionView, TriageOrchestrator, TurnReply};
pub use phrasing::{
    FakePhrasingAdapter, PhrasedQuestion, PhrasingAdapter, PhrasingRequest, RemotePhrasingAdapter,
};
pub use policy::{Branch, Decision, FollowUpPolicy};
pub use report::TriageReport;
pub use resolver::YesNoResolver;
pub use scorer::{RiskAssessment, TriageScorer};
pub use slots::{BoolSlot, CanonicalQuestion, SlotStore, Slots};
pub use summary::SummaryGenerator;
pub use topics::TopicDetector;
