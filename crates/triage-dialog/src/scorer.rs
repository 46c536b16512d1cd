//! Keyword-based risk scoring over the whole transcript.

use triage_core::types::{join_contents, Message, TriageLevel};

use crate::keywords::{self, fold, KeywordGroup};

/// Score at or above which the level is emergency.
pub const EMERGENCY_THRESHOLD: u32 = 6;
/// Score at or above which the level is outpatient.
pub const OUTPATIENT_THRESHOLD: u32 = 3;

/// One additive rule: all groups must match for the weight to count.
struct Rule {
    weight: u32,
    all_of: &'static [KeywordGroup],
}

const RULES: &[Rule] = &[
    Rule {
        weight: 3,
        all_of: &[keywords::CHEST_WORD, keywords::PAIN_WORD],
    },
    Rule {
        weight: 2,
        all_of: &[keywords::BREATHING],
    },
    Rule {
        weight: 2,
        all_of: &[keywords::COLD_SWEAT],
    },
    Rule {
        weight: 2,
        all_of: &[keywords::SYNCOPE],
    },
    Rule {
        weight: 1,
        all_of: &[keywords::ABDOMEN_WORD, keywords::PAIN_WORD],
    },
    Rule {
        weight: 1,
        all_of: &[keywords::FEVER_WORD],
    },
];

/// Score plus the level it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: TriageLevel,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TriageScorer;

impl TriageScorer {
    pub fn new() -> Self {
        Self
    }

    /// Sum the weights of every rule satisfied by `text`.
    pub fn score(&self, text: &str) -> u32 {
        let folded = fold(text);
        RULES
            .iter()
            .filter(|rule| rule.all_of.iter().all(|g| g.matches(&folded)))
            .map(|rule| rule.weight)
            .sum()
    }

    pub fn level(&self, score: u32) -> TriageLevel {
        if score >= EMERGENCY_THRESHOLD {
            TriageLevel::Emergency
        } else if score >= OUTPATIENT_THRESHOLD {
            TriageLevel::Outpatient
        } else {
            TriageLevel::Home
        }
    }

    pub fn assess_text(&self, text: &str) -> RiskAssessment {
        let score = self.score(text);
        RiskAssessment {
            score,
            level: self.level(score),
        }
    }

    /// Assess the full transcript, both roles included.
    pub fn assess(&self, transcript: &[Message]) -> RiskAssessment {
        self.assess_text(&join_contents(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> u32 {
        TriageScorer::new().score(text)
    }

    #[test]
    fn test_empty_transcript_is_home() {
        let a = TriageScorer::new().assess(&[]);
        assert_eq!(a.score, 0);
        assert_eq!(a.level, TriageLevel::Home);
    }

    #[test]
    fn test_individual_rules() {
        assert_eq!(score("가슴 통증"), 3);
        assert_eq!(score("가슴이 답답"), 0);
        assert_eq!(score("숨이 차요"), 2);
        assert_eq!(score("식은땀"), 2);
        assert_eq!(score("실신했어요"), 2);
        assert_eq!(score("의식이 흐려요"), 2);
        assert_eq!(score("복부 통증"), 1);
        assert_eq!(score("열이 나요"), 1);
    }

    #[test]
    fn test_chest_breath_sweat_is_emergency() {
        let a = TriageScorer::new().assess_text("가슴 통증이 있고 숨이 차며 식은땀이 나요");
        assert!(a.score >= 7);
        assert_eq!(a.level, TriageLevel::Emergency);
    }

    #[test]
    fn test_thresholds() {
        let s = TriageScorer::new();
        assert_eq!(s.level(0), TriageLevel::Home);
        assert_eq!(s.level(2), TriageLevel::Home);
        assert_eq!(s.level(3), TriageLevel::Outpatient);
        assert_eq!(s.level(5), TriageLevel::Outpatient);
        assert_eq!(s.level(6), TriageLevel::Emergency);
    }

    #[test]
    fn test_assess_joins_both_roles() {
        let transcript = vec![
            Message::assistant("안정 시에도 숨이 차신가요?"),
            Message::user("가슴 통증이 있어요"),
        ];
        let a = TriageScorer::new().assess(&transcript);
        assert_eq!(a.score, 5);
        assert_eq!(a.level, TriageLevel::Outpatient);
    }
}
