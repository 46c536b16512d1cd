//! One-sentence findings summary of the transcript.

use triage_core::types::{join_contents, Message};

use crate::keywords::{self, fold};

pub const NO_FINDINGS: &str = "특이 증상 없음.";
pub const CHEST_SWEAT_BREATH: &str = "가슴 통증, 식은땀, 호흡 곤란 증상.";

#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryGenerator;

impl SummaryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Findings in fixed order.
    pub fn findings(&self, text: &str) -> Vec<&'static str> {
        let t = fold(text);
        let chest_pain = (keywords::CHEST_WORD.matches(&t) && keywords::PAIN_WORD.matches(&t))
            || keywords::CHEST_PAIN_LITERAL.matches(&t);

        let checks = [
            (chest_pain, "가슴 통증"),
            (keywords::BREATHING.matches(&t), "호흡 곤란"),
            (keywords::COLD_SWEAT.matches(&t), "식은땀"),
            (keywords::SYNCOPE.matches(&t), "실신/의식저하"),
            (
                keywords::ABDOMEN_WORD.matches(&t) && keywords::PAIN_WORD.matches(&t),
                "복부 통증",
            ),
            (keywords::FEVER_WORD.matches(&t), "발열"),
            (keywords::COUGH_WORD.matches(&t), "기침"),
        ];
        checks
            .into_iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, label)| label)
            .collect()
    }

    pub fn summarize_text(&self, text: &str) -> String {
        let t = fold(text);
        if keywords::CHEST_WORD.matches(&t)
            && keywords::PAIN_WORD.matches(&t)
            && keywords::COLD_SWEAT.matches(&t)
            && keywords::BREATHING.matches(&t)
        {
            return CHEST_SWEAT_BREATH.to_string();
        }

        let found = self.findings(&t);
        if found.is_empty() {
            NO_FINDINGS.to_string()
        } else {
            format!("{} 증상.", found.join(", "))
        }
    }

    pub fn summarize(&self, transcript: &[Message]) -> String {
        self.summarize_text(&join_contents(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(text: &str) -> String {
        SummaryGenerator::new().summarize_text(text)
    }

    #[test]
    fn test_no_findings() {
        assert_eq!(summarize(""), NO_FINDINGS);
        assert_eq!(summarize("괜찮아요"), NO_FINDINGS);
    }

    #[test]
    fn test_composite_override() {
        assert_eq!(
            summarize("가슴 통증이 있고 식은땀이 나며 숨이 차요"),
            CHEST_SWEAT_BREATH
        );
    }

    #[test]
    fn test_composite_needs_breathing() {
        assert_eq!(summarize("가슴 통증과 식은땀"), "가슴 통증, 식은땀 증상.");
    }

    #[test]
    fn test_chest_pain_literal() {
        assert_eq!(summarize("흉통이 있어요"), "가슴 통증 증상.");
    }

    #[test]
    fn test_findings_order() {
        let f = SummaryGenerator::new().findings("기침과 열, 복부 통증, 실신");
        assert_eq!(f, vec!["실신/의식저하", "복부 통증", "발열", "기침"]);
    }

    #[test]
    fn test_summarize_transcript() {
        let transcript = vec![
            Message::assistant("어디가 불편하세요?"),
            Message::user("기침이 나요"),
        ];
        assert_eq!(SummaryGenerator::new().summarize(&transcript), "기침 증상.");
    }
}
