//! Diagnosis assembly: score, summary and facility list from one transcript.

use triage_core::types::{Consent, Diagnosis, Message};

use crate::hospitals::HospitalDirectory;
use crate::scorer::TriageScorer;
use crate::summary::SummaryGenerator;

#[derive(Debug, Default, Clone, Copy)]
pub struct Diagnoser {
    scorer: TriageScorer,
    summary: SummaryGenerator,
    directory: HospitalDirectory,
}

impl Diagnoser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a full diagnosis over a transcript snapshot.
    pub fn diagnose(&self, transcript: &[Message], consent: &Consent) -> Diagnosis {
        let risk = self.scorer.assess(transcript);
        let summary = self.summary.summarize(transcript);
        let hospitals = self.directory.suggest(risk.level, consent);

        tracing::info!(
            level = %risk.level,
            score = risk.score,
            hospitals = hospitals.len(),
            "Diagnosis computed"
        );

        Diagnosis {
            triage_level: risk.level,
            risk_score: risk.score,
            summary,
            hospitals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::types::TriageLevel;

    #[test]
    fn test_diagnose_emergency_with_location() {
        let transcript = vec![
            Message::user("가슴 통증이 심해요"),
            Message::assistant("안정 시에도 숨이 차신가요?"),
            Message::user("네. 식은땀도 나요"),
        ];
        let consent = Consent {
            privacy: true,
            location: true,
        };
        let d = Diagnoser::new().diagnose(&transcript, &consent);
        assert_eq!(d.triage_level, TriageLevel::Emergency);
        assert_eq!(d.risk_score, 7);
        assert_eq!(d.summary, "가슴 통증, 식은땀, 호흡 곤란 증상.");
        assert_eq!(d.hospitals.len(), 3);
    }

    #[test]
    fn test_diagnose_without_location() {
        let transcript = vec![Message::user("복부 통증이 있고 열이 나요")];
        let d = Diagnoser::new().diagnose(&transcript, &Consent::default());
        assert_eq!(d.risk_score, 2);
        assert_eq!(d.triage_level, TriageLevel::Home);
        assert!(d.hospitals.is_empty());
        assert_eq!(d.summary, "복부 통증, 발열 증상.");
    }
}
