//! Conversation-lifetime clinical memory.
//!
//! Holds the slots inferred over the whole conversation and the record of
//! which canonical follow-up questions have already been emitted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use triage_core::types::Entities;

// =============================================================================
// CanonicalQuestion
// =============================================================================

/// A follow-up question identified by topic rather than wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalQuestion {
    Duration,
    WorseMove,
    SobRest,
    GiCombo,
    Sweat,
    Clarify,
}

/// Question-text markers, tested in order; the first hit names the question.
const TEXT_MARKERS: &[(CanonicalQuestion, &[&str])] = &[
    (
        CanonicalQuestion::Duration,
        &["언제부터", "지속", "몇 분/시간"],
    ),
    (
        CanonicalQuestion::WorseMove,
        &["움직이거나 숨쉴 때 더 심해지나요"],
    ),
    (CanonicalQuestion::SobRest, &["안정 시에도 숨이 차신가요"]),
    (CanonicalQuestion::GiCombo, &["구토나 설사가 동반되나요"]),
    (CanonicalQuestion::Sweat, &["식은땀"]),
    (CanonicalQuestion::Clarify, &["불편하신 부위와 증상"]),
];

impl CanonicalQuestion {
    pub const ALL: [CanonicalQuestion; 6] = [
        CanonicalQuestion::Duration,
        CanonicalQuestion::WorseMove,
        CanonicalQuestion::SobRest,
        CanonicalQuestion::GiCombo,
        CanonicalQuestion::Sweat,
        CanonicalQuestion::Clarify,
    ];

    /// Recognise a canonical question from arbitrary (possibly rephrased) text.
    pub fn from_question_text(text: &str) -> Option<Self> {
        let t = text.trim();
        TEXT_MARKERS
            .iter()
            .find(|(_, markers)| markers.iter().any(|m| t.contains(m)))
            .map(|(q, _)| *q)
    }
}

// =============================================================================
// Slots
// =============================================================================

/// Cumulative clinical facts. A slot that holds a value never returns to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    pub sob_at_rest: Option<bool>,
    pub gi_combo: Option<bool>,
    pub pain_worse_with_move: Option<bool>,
    pub chest_pain_duration: Option<String>,
}

/// Boolean slot addressed by a yes/no answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolSlot {
    SobAtRest,
    GiCombo,
    PainWorseWithMove,
}

impl BoolSlot {
    /// The canonical question whose answer fills this slot.
    pub fn question(self) -> CanonicalQuestion {
        match self {
            BoolSlot::SobAtRest => CanonicalQuestion::SobRest,
            BoolSlot::GiCombo => CanonicalQuestion::GiCombo,
            BoolSlot::PainWorseWithMove => CanonicalQuestion::WorseMove,
        }
    }
}

impl Slots {
    pub fn get(&self, slot: BoolSlot) -> Option<bool> {
        match slot {
            BoolSlot::SobAtRest => self.sob_at_rest,
            BoolSlot::GiCombo => self.gi_combo,
            BoolSlot::PainWorseWithMove => self.pain_worse_with_move,
        }
    }

    pub fn has_duration(&self) -> bool {
        self.chest_pain_duration
            .as_deref()
            .is_some_and(|d| !d.is_empty())
    }
}

// =============================================================================
// SlotStore
// =============================================================================

/// Slots plus asked-question bookkeeping for one conversation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SlotStore {
    slots: Slots,
    asked: BTreeSet<CanonicalQuestion>,
    /// Literal question strings in the order they were answered or asked.
    asked_log: Vec<String>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// Fold this turn's entities into the slots.
    ///
    /// The only entity that feeds a slot is the duration: a found duration
    /// always replaces `chest_pain_duration`.
    pub fn absorb_entities(&mut self, entities: &Entities) {
        if let Some(duration) = entities.duration.as_deref().filter(|d| !d.is_empty()) {
            tracing::debug!(duration, "Duration slot updated");
            self.slots.chest_pain_duration = Some(duration.to_string());
        }
    }

    /// Record a yes/no answer for a boolean slot.
    pub fn set_answer(&mut self, slot: BoolSlot, value: bool) {
        let target = match slot {
            BoolSlot::SobAtRest => &mut self.slots.sob_at_rest,
            BoolSlot::GiCombo => &mut self.slots.gi_combo,
            BoolSlot::PainWorseWithMove => &mut self.slots.pain_worse_with_move,
        };
        *target = Some(value);
    }

    pub fn is_asked(&self, question: CanonicalQuestion) -> bool {
        self.asked.contains(&question)
    }

    /// Set the asked-flag. Flags are never cleared except by [`reset`](Self::reset).
    pub fn mark_asked(&mut self, question: CanonicalQuestion) {
        self.asked.insert(question);
    }

    /// Set the asked-flag for whichever canonical question `text` names.
    pub fn mark_asked_by_text(&mut self, text: &str) -> Option<CanonicalQuestion> {
        let question = CanonicalQuestion::from_question_text(text)?;
        self.mark_asked(question);
        Some(question)
    }

    /// Append a literal question to the log unless already present.
    pub fn log_question(&mut self, text: &str) {
        if !self.asked_log.iter().any(|q| q == text) {
            self.asked_log.push(text.to_string());
        }
    }

    pub fn asked_log(&self) -> &[String] {
        &self.asked_log
    }

    /// Asked canonical questions in declaration order.
    pub fn asked_questions(&self) -> Vec<CanonicalQuestion> {
        self.asked.iter().copied().collect()
    }

    /// Forget everything. Only used when the whole conversation restarts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Canonical question recognition ----

    #[test]
    fn test_from_question_text_each_marker() {
        use CanonicalQuestion::*;
        assert_eq!(
            CanonicalQuestion::from_question_text("통증은 언제부터 시작되었나요?"),
            Some(Duration)
        );
        assert_eq!(
            CanonicalQuestion::from_question_text("통증이 움직이거나 숨쉴 때 더 심해지나요?"),
            Some(WorseMove)
        );
        assert_eq!(
            CanonicalQuestion::from_question_text("안정 시에도 숨이 차신가요?"),
            Some(SobRest)
        );
        assert_eq!(
            CanonicalQuestion::from_question_text("구토나 설사가 동반되나요?"),
            Some(GiCombo)
        );
        assert_eq!(
            CanonicalQuestion::from_question_text("식은땀이 지금도 계속 나시나요?"),
            Some(Sweat)
        );
        assert_eq!(
            CanonicalQuestion::from_question_text("지금 불편하신 부위와 증상을 말씀해주세요"),
            Some(Clarify)
        );
        assert_eq!(CanonicalQuestion::from_question_text("진단을 진행하겠습니다."), None);
    }

    #[test]
    fn test_from_question_text_first_marker_wins() {
        // Mentions both persistence and cold sweat: duration is tested first.
        assert_eq!(
            CanonicalQuestion::from_question_text("식은땀이 얼마나 지속되었나요?"),
            Some(CanonicalQuestion::Duration)
        );
    }

    // ---- Slots ----

    #[test]
    fn test_absorb_entities_writes_duration() {
        let mut store = SlotStore::new();
        let entities = Entities {
            duration: Some("30분".to_string()),
            ..Entities::default()
        };
        store.absorb_entities(&entities);
        assert_eq!(store.slots().chest_pain_duration.as_deref(), Some("30분"));
        assert!(store.slots().has_duration());
    }

    #[test]
    fn test_absorb_entities_without_duration_keeps_value() {
        let mut store = SlotStore::new();
        store.absorb_entities(&Entities {
            duration: Some("어제부터".to_string()),
            ..Entities::default()
        });
        store.absorb_entities(&Entities::default());
        assert_eq!(store.slots().chest_pain_duration.as_deref(), Some("어제부터"));
    }

    #[test]
    fn test_absorb_entities_newer_duration_replaces() {
        let mut store = SlotStore::new();
        store.absorb_entities(&Entities {
            duration: Some("30분".to_string()),
            ..Entities::default()
        });
        store.absorb_entities(&Entities {
            duration: Some("2시간".to_string()),
            ..Entities::default()
        });
        assert_eq!(store.slots().chest_pain_duration.as_deref(), Some("2시간"));
    }

    #[test]
    fn test_set_answer_and_reassign() {
        let mut store = SlotStore::new();
        store.set_answer(BoolSlot::SobAtRest, true);
        assert_eq!(store.slots().get(BoolSlot::SobAtRest), Some(true));
        store.set_answer(BoolSlot::SobAtRest, false);
        assert_eq!(store.slots().sob_at_rest, Some(false));
        assert_eq!(store.slots().gi_combo, None);
    }

    #[test]
    fn test_bool_slot_question_mapping() {
        assert_eq!(BoolSlot::SobAtRest.question(), CanonicalQuestion::SobRest);
        assert_eq!(BoolSlot::GiCombo.question(), CanonicalQuestion::GiCombo);
        assert_eq!(
            BoolSlot::PainWorseWithMove.question(),
            CanonicalQuestion::WorseMove
        );
    }

    // ---- Asked-flags ----

    #[test]
    fn test_mark_asked_by_text() {
        let mut store = SlotStore::new();
        let q = store.mark_asked_by_text("안정 시에도 숨이 차신가요?");
        assert_eq!(q, Some(CanonicalQuestion::SobRest));
        assert!(store.is_asked(CanonicalQuestion::SobRest));
        assert!(!store.is_asked(CanonicalQuestion::GiCombo));
    }

    #[test]
    fn test_log_question_dedupes() {
        let mut store = SlotStore::new();
        store.log_question("구토나 설사가 동반되나요?");
        store.log_question("구토나 설사가 동반되나요?");
        store.log_question("안정 시에도 숨이 차신가요?");
        assert_eq!(store.asked_log().len(), 2);
        assert_eq!(store.asked_log()[0], "구토나 설사가 동반되나요?");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = SlotStore::new();
        store.set_answer(BoolSlot::GiCombo, true);
        store.mark_asked(CanonicalQuestion::Clarify);
        store.log_question("q?");
        store.reset();
        assert_eq!(store.slots(), &Slots::default());
        assert!(store.asked_questions().is_empty());
        assert!(store.asked_log().is_empty());
    }
}
