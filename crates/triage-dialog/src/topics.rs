//! Coarse topic tagging over the recent conversation window.

use triage_core::types::{join_contents, Message, Topics};

use crate::keywords::{self, fold};

/// Scans text for topic tags. Pure; tags may co-occur.
#[derive(Debug, Clone, Copy)]
pub struct TopicDetector {
    /// Number of trailing transcript entries included in the window.
    pub window: usize,
}

impl Default for TopicDetector {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl TopicDetector {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Every tag with at least one group member present in `text`.
    pub fn detect(&self, text: &str) -> Topics {
        let folded = fold(text);
        keywords::TOPICS
            .iter()
            .filter(|(_, group)| group.matches(&folded))
            .map(|(topic, _)| *topic)
            .collect()
    }

    /// Build the detection window: the last `window` transcript entries
    /// followed by the current utterance.
    ///
    /// The caller appends the utterance to the transcript first, so it is
    /// also the newest entry of the window.
    pub fn window_text(&self, transcript: &[Message], utterance: &str) -> String {
        let start = transcript.len().saturating_sub(self.window);
        let recent = join_contents(&transcript[start..]);
        format!("{} {}", recent, utterance)
    }

    /// Detect topics over the window for this turn.
    pub fn detect_in_window(&self, transcript: &[Message], utterance: &str) -> Topics {
        self.detect(&self.window_text(transcript, utterance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::types::Topic;

    #[test]
    fn test_detect_none() {
        assert!(TopicDetector::default().detect("괜찮아요").is_empty());
        assert!(TopicDetector::default().detect("").is_empty());
    }

    #[test]
    fn test_detect_co_occurring_tags() {
        let topics = TopicDetector::default().detect("가슴 통증이 있고 숨이 차요");
        assert!(topics.contains(&Topic::Chest));
        assert!(topics.contains(&Topic::Pain));
        assert!(topics.contains(&Topic::Respiratory));
        assert!(!topics.contains(&Topic::Abdomen));
    }

    #[test]
    fn test_detect_each_tag() {
        let d = TopicDetector::default();
        assert!(d.detect("기침이 나요").contains(&Topic::Cough));
        assert!(d.detect("열이 나요").contains(&Topic::FeverSweat));
        assert!(d.detect("어지럼증").contains(&Topic::Dizziness));
        assert!(d.detect("아랫배").contains(&Topic::Abdomen));
    }

    #[test]
    fn test_window_uses_last_entries_only() {
        let transcript = vec![
            Message::user("기침이 심해요"),
            Message::assistant("언제부터였나요?"),
            Message::user("어제부터요"),
            Message::assistant("다른 증상은요?"),
        ];
        let d = TopicDetector::new(3);
        let topics = d.detect_in_window(&transcript, "배가 아파요");
        assert!(!topics.contains(&Topic::Cough));
        assert!(topics.contains(&Topic::Abdomen));
    }

    #[test]
    fn test_window_includes_appended_utterance() {
        let transcript = vec![
            Message::user("숨이 차요"),
            Message::assistant("안정 시에도 숨이 차신가요?"),
            Message::user("네, 가슴도 아파요"),
            Message::assistant("통증은 언제부터 시작되었나요?"),
            Message::user("30분이요"),
        ];
        let d = TopicDetector::new(3);
        assert_eq!(
            d.window_text(&transcript, "30분이요"),
            "네, 가슴도 아파요 통증은 언제부터 시작되었나요? 30분이요 30분이요"
        );
        let topics = d.detect_in_window(&transcript, "30분이요");
        assert!(topics.contains(&Topic::Chest));
        assert!(topics.contains(&Topic::Pain));
        assert!(!topics.contains(&Topic::Respiratory));
    }

    #[test]
    fn test_window_shorter_than_transcript_is_safe() {
        let transcript = vec![Message::user("가슴")];
        let d = TopicDetector::new(5);
        assert_eq!(d.window_text(&transcript, "통증"), "가슴 통증");
    }
}
