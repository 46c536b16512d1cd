//! Named keyword groups.
//!
//! Every rule in the engine is a case-folded substring test against one of
//! these groups. Groups that appear in ordered slices are tested in slice
//! order and the first match wins.

use triage_core::types::{Region, Topic};

/// A named set of literal tokens.
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub tokens: &'static [&'static str],
}

impl KeywordGroup {
    pub const fn new(name: &'static str, tokens: &'static [&'static str]) -> Self {
        Self { name, tokens }
    }

    /// True if any token is a substring of `folded`.
    ///
    /// `folded` must already be lower-cased (see [`fold`]).
    pub fn matches(&self, folded: &str) -> bool {
        self.tokens.iter().any(|t| folded.contains(t))
    }
}

/// Case-fold text once before running several groups over it.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

// =============================================================================
// Entity extraction
// =============================================================================

pub const PAIN: KeywordGroup = KeywordGroup::new(
    "pain",
    &["아파", "아픔", "통증", "찌릿", "쑤심", "콕", "조이", "체한"],
);

pub const RESPIRATORY: KeywordGroup =
    KeywordGroup::new("respiratory", &["숨", "호흡", "호흡곤란", "숨차", "가쁨"]);

pub const GASTRO: KeywordGroup = KeywordGroup::new(
    "gastro",
    &["구토", "메스꺼", "구역", "설사", "변", "소변", "빈뇨", "배뇨통"],
);

pub const SWEAT: KeywordGroup = KeywordGroup::new("sweat", &["식은땀", "땀"]);

pub const FEVER: KeywordGroup = KeywordGroup::new("fever", &["열", "발열", "미열", "고열"]);

/// Region groups in priority order.
pub const REGIONS: &[(Region, KeywordGroup)] = &[
    (
        Region::Chest,
        KeywordGroup::new("chest", &["가슴", "흉통", "흉부", "흉골", "명치"]),
    ),
    (
        Region::Abdomen,
        KeywordGroup::new("abdomen", &["복부", "배", "아랫배", "윗배"]),
    ),
    (
        Region::Right,
        KeywordGroup::new("right", &["오른쪽", "우측", "우상", "우하"]),
    ),
    (
        Region::Left,
        KeywordGroup::new("left", &["왼쪽", "좌측", "좌상", "좌하"]),
    ),
];

// =============================================================================
// Topic detection
// =============================================================================

/// Topic groups. All groups are tested; tags may co-occur.
pub const TOPICS: &[(Topic, KeywordGroup)] = &[
    (
        Topic::Pain,
        KeywordGroup::new("topic_pain", &["통증", "아픔", "쑤심", "찌름", "아려움"]),
    ),
    (
        Topic::Chest,
        KeywordGroup::new("topic_chest", &["가슴", "흉통", "심장", "흉부", "명치"]),
    ),
    (
        Topic::Respiratory,
        KeywordGroup::new("topic_respiratory", &["호흡", "숨", "호흡곤란"]),
    ),
    (
        Topic::Cough,
        KeywordGroup::new("topic_cough", &["기침", "가래"]),
    ),
    (
        Topic::FeverSweat,
        KeywordGroup::new("topic_fever_sweat", &["발열", "열", "식은땀"]),
    ),
    (
        Topic::Dizziness,
        KeywordGroup::new("topic_dizziness", &["어지럼", "실신", "쓰러짐"]),
    ),
    (
        Topic::Abdomen,
        KeywordGroup::new("topic_abdomen", &["복부", "배", "아랫배", "윗배"]),
    ),
];

// =============================================================================
// Transcript scoring and summary
// =============================================================================

pub const CHEST_WORD: KeywordGroup = KeywordGroup::new("chest_word", &["가슴"]);
pub const PAIN_WORD: KeywordGroup = KeywordGroup::new("pain_word", &["통증"]);
pub const CHEST_PAIN_LITERAL: KeywordGroup = KeywordGroup::new("chest_pain_literal", &["흉통"]);
pub const BREATHING: KeywordGroup = KeywordGroup::new("breathing", &["숨", "호흡", "호흡곤란"]);
pub const COLD_SWEAT: KeywordGroup = KeywordGroup::new("cold_sweat", &["식은땀"]);
pub const SYNCOPE: KeywordGroup = KeywordGroup::new("syncope", &["실신", "의식"]);
pub const ABDOMEN_WORD: KeywordGroup = KeywordGroup::new("abdomen_word", &["복부"]);
pub const FEVER_WORD: KeywordGroup = KeywordGroup::new("fever_word", &["발열", "열"]);
pub const COUGH_WORD: KeywordGroup = KeywordGroup::new("cough_word", &["기침"]);
