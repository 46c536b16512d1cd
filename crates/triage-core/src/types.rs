use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Per-utterance signals
// =============================================================================

/// Body region named in an utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Chest,
    Abdomen,
    Right,
    Left,
}

/// Dominant complaint of an utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainSymptom {
    Pain,
    Dyspnea,
    /// Gastro-intestinal or urinary complaint.
    Gi,
}

/// Intensity word, in the order the extractor tests them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 조금
    Little,
    /// 약간
    Slight,
    /// 중간
    Medium,
    /// 보통
    Usual,
    /// 많이
    Much,
    /// 매우
    Very,
    /// 심하게
    Severe,
    /// 너무
    Extreme,
}

impl Severity {
    /// All severities in matching priority order.
    pub const ALL: [Severity; 8] = [
        Severity::Little,
        Severity::Slight,
        Severity::Medium,
        Severity::Usual,
        Severity::Much,
        Severity::Very,
        Severity::Severe,
        Severity::Extreme,
    ];

    /// The literal word that signals this severity.
    pub fn word(self) -> &'static str {
        match self {
            Severity::Little => "조금",
            Severity::Slight => "약간",
            Severity::Medium => "중간",
            Severity::Usual => "보통",
            Severity::Much => "많이",
            Severity::Very => "매우",
            Severity::Severe => "심하게",
            Severity::Extreme => "너무",
        }
    }
}

/// Accompanying symptom that may co-occur with the main complaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Associated {
    Sweat,
    Fever,
}

/// Structured signal bundle extracted from a single utterance.
///
/// Recomputed from the latest utterance only; never accumulated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub region: Option<Region>,
    /// Normalised duration token, e.g. `30분`, `두시간`, `어제부터`.
    pub duration: Option<String>,
    pub severity: Option<Severity>,
    pub main_symptom: Option<MainSymptom>,
    pub associated: BTreeSet<Associated>,
}

impl Entities {
    /// True when no signal category was recognised.
    pub fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.duration.is_none()
            && self.severity.is_none()
            && self.main_symptom.is_none()
            && self.associated.is_empty()
    }
}

/// Coarse topic tag detected over the recent conversation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Pain,
    Chest,
    Respiratory,
    Cough,
    FeverSweat,
    Dizziness,
    Abdomen,
}

/// Topic tags present in one detection window.
pub type Topics = BTreeSet<Topic>;

// =============================================================================
// Transcript
// =============================================================================

/// Speaker of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,
    User,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Join message contents with single spaces, the form every keyword rule reads.
pub fn join_contents(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Diagnosis
// =============================================================================

/// Final triage recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    Emergency,
    Outpatient,
    Home,
}

impl TriageLevel {
    /// Short Korean label (응급 / 외래 / 가정).
    pub fn label(self) -> &'static str {
        match self {
            TriageLevel::Emergency => "응급",
            TriageLevel::Outpatient => "외래",
            TriageLevel::Home => "가정",
        }
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriageLevel::Emergency => "emergency",
            TriageLevel::Outpatient => "outpatient",
            TriageLevel::Home => "home",
        };
        f.write_str(s)
    }
}

/// A nearby facility suggested alongside a diagnosis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub distance_km: f64,
    pub address: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
}

/// Result of one diagnosis run. Replaced wholesale when diagnosis re-runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub triage_level: TriageLevel,
    pub risk_score: u32,
    pub summary: String,
    pub hospitals: Vec<Hospital>,
}

// =============================================================================
// Patient
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "남자",
            Gender::Female => "여자",
        }
    }
}

/// Basic information collected before the dialogue starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub gender: Gender,
    /// Age in full years, 1..=120.
    pub age: u8,
    /// Past or current conditions; empty means none.
    pub history: Vec<String>,
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 50,
            history: vec!["고혈압".to_string()],
        }
    }
}

impl PatientProfile {
    pub const MIN_AGE: u8 = 1;
    pub const MAX_AGE: u8 = 120;

    pub fn is_valid_age(age: u8) -> bool {
        (Self::MIN_AGE..=Self::MAX_AGE).contains(&age)
    }

    /// History joined for display, or `과거력 없음` when empty.
    pub fn history_label(&self) -> String {
        if self.history.is_empty() {
            "과거력 없음".to_string()
        } else {
            self.history.join(", ")
        }
    }
}

/// Consents given by the user at the start of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    /// Agreement to collect profile and symptom data.
    pub privacy: bool,
    /// Permission to use location for the nearby-hospital list.
    pub location: bool,
}
