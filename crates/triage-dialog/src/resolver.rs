//! Yes/no answer resolution against the pending question.

use crate::slots::{BoolSlot, SlotStore};

/// Leading tokens that make an answer affirmative.
const AFFIRMATIVE_PREFIXES: &[&str] = &["네"];
/// Phrases anywhere in the answer that make it affirmative.
const AFFIRMATIVE_PHRASES: &[&str] = &["예", "있습니다", "맞아요"];
/// Leading tokens that make an answer negative.
const NEGATIVE_PREFIXES: &[&str] = &["아니"];
/// Phrases anywhere in the answer that make it negative.
const NEGATIVE_PHRASES: &[&str] = &["없습니다", "괜찮습니다", "아닙니다"];

/// Question templates whose yes/no answer fills a slot.
const SLOT_TEMPLATES: &[(&str, BoolSlot)] = &[
    ("안정 시에도 숨이 차신가요", BoolSlot::SobAtRest),
    ("구토나 설사가 동반되나요", BoolSlot::GiCombo),
    (
        "통증이 움직이거나 숨쉴 때 더 심해지나요",
        BoolSlot::PainWorseWithMove,
    ),
];

/// What an answer resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub answer: bool,
    /// The slot written, if the question maps to one.
    pub slot: Option<BoolSlot>,
}

/// Maps free-text answers to booleans and records them in the [`SlotStore`].
#[derive(Debug, Default, Clone, Copy)]
pub struct YesNoResolver;

impl YesNoResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn is_affirmative(&self, text: &str) -> bool {
        let t = text.trim();
        AFFIRMATIVE_PREFIXES.iter().any(|p| t.starts_with(p))
            || AFFIRMATIVE_PHRASES.iter().any(|p| t.contains(p))
    }

    pub fn is_negative(&self, text: &str) -> bool {
        let t = text.trim();
        NEGATIVE_PREFIXES.iter().any(|p| t.starts_with(p))
            || NEGATIVE_PHRASES.iter().any(|p| t.contains(p))
    }

    /// Classify an answer. A leading marker decides before any contained
    /// phrase, so `아니예요` is negative and `네, 없습니다` is affirmative.
    /// Without a leading marker an affirmative phrase beats a negative one,
    /// so `괜찮습니다. 예전에도 그랬어요` resolves to yes.
    pub fn classify(&self, text: &str) -> Option<bool> {
        let t = text.trim();
        if AFFIRMATIVE_PREFIXES.iter().any(|p| t.starts_with(p)) {
            return Some(true);
        }
        if NEGATIVE_PREFIXES.iter().any(|p| t.starts_with(p)) {
            return Some(false);
        }
        if self.is_affirmative(t) {
            return Some(true);
        }
        if self.is_negative(t) {
            return Some(false);
        }
        None
    }

    /// The slot a question fills, if any.
    pub fn slot_for_question(&self, question: &str) -> Option<BoolSlot> {
        SLOT_TEMPLATES
            .iter()
            .find(|(template, _)| question.contains(template))
            .map(|(_, slot)| *slot)
    }

    /// Apply `answer` to the pending `question`.
    ///
    /// Non-informative answers change nothing and return `None`. Otherwise
    /// the mapped slot (if any) is written, the question is logged and its
    /// asked-flag is set.
    pub fn apply(&self, question: &str, answer: &str, store: &mut SlotStore) -> Option<Resolution> {
        let value = self.classify(answer)?;

        let slot = self.slot_for_question(question);
        if let Some(slot) = slot {
            store.set_answer(slot, value);
            tracing::debug!(?slot, value, "Yes/no answer recorded");
        }

        store.log_question(question);
        store.mark_asked_by_text(question);

        Some(Resolution {
            answer: value,
            slot,
        })
    }
}
