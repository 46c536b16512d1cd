//! Per-utterance entity extraction.
//!
//! Turns one utterance into an [`Entities`] bundle: body region, duration,
//! severity, main symptom and associated symptoms. Each category is an
//! independent first-match-wins test; absence of a signal leaves the field
//! empty.

use std::sync::LazyLock;

use regex::Regex;

use triage_core::types::{Associated, Entities, MainSymptom, Severity};

use crate::keywords::{self, fold};

// =============================================================================
// Duration patterns (compiled once, reused across calls)
// =============================================================================

/// `<integer> <unit>`, e.g. `30분`, `2 시간`.
static NUMERIC_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(분|시간|일|주|개월)").expect("Invalid numeric duration regex")
});

/// Korean numeral word plus unit, e.g. `두 시간`.
static WORD_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(한|두|세|네)\s*(분|시간|일|주|개월)").expect("Invalid word duration regex")
});

/// Literal onset phrases tried after both patterns, in order.
const ONSET_FALLBACKS: &[(&str, &str)] = &[("어제", "어제부터"), ("오늘", "오늘부터")];

/// Main symptom groups in priority order: pain > dyspnea > gi.
const MAIN_SYMPTOMS: &[(MainSymptom, keywords::KeywordGroup)] = &[
    (MainSymptom::Pain, keywords::PAIN),
    (MainSymptom::Dyspnea, keywords::RESPIRATORY),
    (MainSymptom::Gi, keywords::GASTRO),
];

// =============================================================================
// EntityExtractor
// =============================================================================

/// Rule-based extractor for a single utterance.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the signal bundle from one utterance.
    ///
    /// Pure: the caller decides what to do with a found duration (see
    /// [`SlotStore::absorb_entities`](crate::slots::SlotStore::absorb_entities)).
    pub fn extract(&self, utterance: &str) -> Entities {
        let text = fold(utterance.trim());
        if text.is_empty() {
            return Entities::default();
        }

        let region = keywords::REGIONS
            .iter()
            .find(|(_, group)| group.matches(&text))
            .map(|(region, _)| *region);

        let severity = Severity::ALL
            .iter()
            .copied()
            .find(|s| text.contains(s.word()));

        let main_symptom = MAIN_SYMPTOMS
            .iter()
            .find(|(_, group)| group.matches(&text))
            .map(|(symptom, _)| *symptom);

        let mut associated = std::collections::BTreeSet::new();
        if keywords::SWEAT.matches(&text) {
            associated.insert(Associated::Sweat);
        }
        if keywords::FEVER.matches(&text) {
            associated.insert(Associated::Fever);
        }

        Entities {
            region,
            duration: self.extract_duration(&text),
            severity,
            main_symptom,
            associated,
        }
    }

    /// Find a duration token: numeric pattern, then numeral word, then the
    /// "yesterday"/"today" onset phrases.
    pub fn extract_duration(&self, text: &str) -> Option<String> {
        if let Some(caps) = NUMERIC_DURATION_RE.captures(text) {
            return Some(format!("{}{}", &caps[1], &caps[2]));
        }
        if let Some(caps) = WORD_DURATION_RE.captures(text) {
            return Some(format!("{}{}", &caps[1], &caps[2]));
        }
        ONSET_FALLBACKS
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map(|(_, token)| (*token).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::types::Region;

    fn extract(text: &str) -> Entities {
        EntityExtractor::new().extract(text)
    }

    // ---- Empty / non-informative input ----

    #[test]
    fn test_empty_input_yields_empty_bundle() {
        assert!(extract("").is_empty());
        assert!(extract("   \n\t").is_empty());
    }

    #[test]
    fn test_no_keywords_yields_empty_bundle() {
        assert!(extract("그냥 그래요").is_empty());
        assert!(extract("hello there").is_empty());
    }

    // ---- Region ----

    #[test]
    fn test_region_chest() {
        assert_eq!(extract("가슴이 답답해요").region, Some(Region::Chest));
        assert_eq!(extract("명치 쪽이요").region, Some(Region::Chest));
    }

    #[test]
    fn test_region_priority_chest_over_abdomen() {
        let e = extract("가슴이랑 배가 같이 불편해요");
        assert_eq!(e.region, Some(Region::Chest));
    }

    #[test]
    fn test_region_sides() {
        assert_eq!(extract("오른쪽 옆구리").region, Some(Region::Right));
        assert_eq!(extract("좌측이 저려요").region, Some(Region::Left));
    }

    // ---- Duration ----

    #[test]
    fn test_duration_numeric() {
        assert_eq!(extract("30분째 아파요").duration.as_deref(), Some("30분"));
        assert_eq!(extract("2 시간 전부터").duration.as_deref(), Some("2시간"));
        assert_eq!(extract("3개월 정도").duration.as_deref(), Some("3개월"));
    }

    #[test]
    fn test_duration_numeral_word() {
        assert_eq!(extract("두 시간 됐어요").duration.as_deref(), Some("두시간"));
        assert_eq!(extract("한주 정도").duration.as_deref(), Some("한주"));
    }

    #[test]
    fn test_duration_numeric_wins_over_word() {
        assert_eq!(
            extract("두 시간인가 30분인가").duration.as_deref(),
            Some("30분")
        );
    }

    #[test]
    fn test_duration_onset_fallbacks() {
        assert_eq!(extract("어제부터 그래요").duration.as_deref(), Some("어제부터"));
        assert_eq!(extract("오늘 아침에").duration.as_deref(), Some("오늘부터"));
        assert_eq!(extract("어제 오늘 계속").duration.as_deref(), Some("어제부터"));
    }

    // ---- Severity ----

    #[test]
    fn test_severity_first_in_list_order() {
        assert_eq!(extract("조금 아파요").severity, Some(Severity::Little));
        assert_eq!(extract("너무 매우 아파요").severity, Some(Severity::Very));
    }

    // ---- Main symptom ----

    #[test]
    fn test_main_symptom_priority() {
        assert_eq!(extract("숨이 차고 아파요").main_symptom, Some(MainSymptom::Pain));
        assert_eq!(extract("숨이 차요").main_symptom, Some(MainSymptom::Dyspnea));
        assert_eq!(extract("설사를 해요").main_symptom, Some(MainSymptom::Gi));
    }

    // ---- Associated ----

    #[test]
    fn test_associated_both_present() {
        let e = extract("식은땀이 나고 열이 있어요");
        assert!(e.associated.contains(&Associated::Sweat));
        assert!(e.associated.contains(&Associated::Fever));
    }

    #[test]
    fn test_associated_sweat_only() {
        let e = extract("땀이 나요");
        assert_eq!(e.associated.len(), 1);
        assert!(e.associated.contains(&Associated::Sweat));
    }

    #[test]
    fn test_full_bundle() {
        let e = extract("가슴이 너무 조이고 30분째 식은땀이 나요");
        assert_eq!(e.region, Some(Region::Chest));
        assert_eq!(e.duration.as_deref(), Some("30분"));
        assert_eq!(e.severity, Some(Severity::Extreme));
        assert_eq!(e.main_symptom, Some(MainSymptom::Pain));
        assert!(e.associated.contains(&Associated::Sweat));
    }
}
