//! Deterministic follow-up question policy.
//!
//! The policy is an ordered decision list. Branches are evaluated top to
//! bottom and the first one that produces a question wins:
//!
//! 1. chest-pain context: duration, then movement-worsening, then rest dyspnea
//! 2. respiratory context: rest dyspnea
//! 3. GI context: vomiting/diarrhoea combination
//! 4. sweating signal: persistence of sweating
//! 5. completion: any active context has all its slots filled -> terminate
//! 6. clarification: ask the user to restate symptoms
//! 7. residual sweep: movement-worsening, rest dyspnea, GI combination
//! 8. forced termination
//!
//! A canonical question is only emitted while its asked-flag is unset, so the
//! policy terminates after at most six distinct questions.

use serde::{Deserialize, Serialize};

use triage_core::types::{Associated, Entities, MainSymptom, Region, Topic, Topics};

use crate::slots::{BoolSlot, CanonicalQuestion, SlotStore};

// =============================================================================
// Question catalogue
// =============================================================================

pub const DURATION_QUESTION: &str =
    "통증은 언제부터 시작되었나요? 대략 몇 분/시간 정도 지속되었는지 알려주세요.";
pub const WORSE_MOVE_QUESTION: &str = "통증이 움직이거나 숨쉴 때 더 심해지나요?";
pub const SOB_REST_QUESTION: &str = "안정 시에도 숨이 차신가요?";
pub const GI_COMBO_QUESTION: &str = "구토나 설사가 동반되나요?";
pub const SWEAT_QUESTION: &str = "식은땀이 지금도 계속 나시나요?";
pub const CLARIFY_QUESTION: &str = "지금 불편하신 부위와 증상을 한 번 더 구체적으로 말씀해주시겠어요? (예: '가슴 중앙이 조이고 30분째 심함')";
pub const TERMINATION_TEXT: &str = "진단을 진행하겠습니다.";

pub const WORSE_MOVE_CHOICES: [&str; 2] = ["네. 더 심해집니다.", "아니요. 비슷합니다."];
pub const SOB_REST_CHOICES: [&str; 2] =
    ["네. 안정 시에도 숨이 찹니다.", "아니요. 활동 시에만 숨이 찹니다."];
pub const GI_COMBO_CHOICES: [&str; 2] = ["네. 있습니다.", "아니요. 없습니다."];
pub const SWEAT_CHOICES: [&str; 2] = ["네. 계속 납니다.", "아니요. 지금은 없습니다."];

impl CanonicalQuestion {
    /// The policy's literal wording.
    pub fn text(self) -> &'static str {
        match self {
            CanonicalQuestion::Duration => DURATION_QUESTION,
            CanonicalQuestion::WorseMove => WORSE_MOVE_QUESTION,
            CanonicalQuestion::SobRest => SOB_REST_QUESTION,
            CanonicalQuestion::GiCombo => GI_COMBO_QUESTION,
            CanonicalQuestion::Sweat => SWEAT_QUESTION,
            CanonicalQuestion::Clarify => CLARIFY_QUESTION,
        }
    }

    /// Closed-answer choices paired with the question. Open questions have none.
    pub fn choices(self) -> &'static [&'static str] {
        match self {
            CanonicalQuestion::Duration | CanonicalQuestion::Clarify => &[],
            CanonicalQuestion::WorseMove => &WORSE_MOVE_CHOICES,
            CanonicalQuestion::SobRest => &SOB_REST_CHOICES,
            CanonicalQuestion::GiCombo => &GI_COMBO_CHOICES,
            CanonicalQuestion::Sweat => &SWEAT_CHOICES,
        }
    }
}

/// Infer quick replies for question text that did not come with any.
pub fn infer_choices(question: &str) -> Vec<String> {
    let pick: &[&str] = if question.contains("숨") || question.contains("호흡") {
        &SOB_REST_CHOICES
    } else if question.contains("쓰러") || question.contains("의식") {
        &["네. 쓰러졌습니다.", "아니요. 쓰러지지 않았습니다."]
    } else if question.contains("땀") {
        &["네. 식은땀이 있습니다.", "아니요. 식은땀은 없습니다."]
    } else if question.contains(WORSE_MOVE_QUESTION.trim_end_matches('?')) {
        &WORSE_MOVE_CHOICES
    } else if question.contains("구토") || question.contains("설사") {
        &GI_COMBO_CHOICES
    } else {
        &[]
    };
    pick.iter().map(|c| (*c).to_string()).collect()
}

// =============================================================================
// Decision
// =============================================================================

/// Which rule produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    ChestPain,
    Respiratory,
    Gastro,
    Sweating,
    Completion,
    Clarification,
    ResidualSweep,
    ForcedTermination,
}

/// The policy's output for one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub branch: Branch,
    /// `None` for termination decisions.
    pub canonical: Option<CanonicalQuestion>,
    pub question: String,
    pub choices: Vec<String>,
    pub ready_to_diagnose: bool,
}

impl Decision {
    fn ask(branch: Branch, question: CanonicalQuestion) -> Self {
        Self {
            branch,
            canonical: Some(question),
            question: question.text().to_string(),
            choices: question.choices().iter().map(|c| (*c).to_string()).collect(),
            ready_to_diagnose: false,
        }
    }

    fn terminate(branch: Branch) -> Self {
        Self {
            branch,
            canonical: None,
            question: TERMINATION_TEXT.to_string(),
            choices: Vec::new(),
            ready_to_diagnose: true,
        }
    }
}

/// Active clinical contexts for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contexts {
    pub chest: bool,
    pub respiratory: bool,
    pub gastro: bool,
}

impl Contexts {
    pub fn detect(entities: &Entities, topics: &Topics) -> Self {
        let symptom = entities.main_symptom;
        Self {
            chest: symptom == Some(MainSymptom::Pain)
                && (entities.region == Some(Region::Chest) || topics.contains(&Topic::Chest)),
            respiratory: symptom == Some(MainSymptom::Dyspnea)
                || topics.contains(&Topic::Respiratory),
            gastro: symptom == Some(MainSymptom::Gi) || topics.contains(&Topic::Abdomen),
        }
    }
}

// =============================================================================
// FollowUpPolicy
// =============================================================================

/// Selects the next question from entities, topics and slot state.
///
/// Reads the store only; the caller commits the decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowUpPolicy;

impl FollowUpPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, entities: &Entities, topics: &Topics, store: &SlotStore) -> Decision {
        let ctx = Contexts::detect(entities, topics);
        let slots = store.slots();

        // Unset and never asked.
        let open_bool = |slot: BoolSlot| slots.get(slot).is_none() && !store.is_asked(slot.question());

        if ctx.chest {
            if !slots.has_duration() && !store.is_asked(CanonicalQuestion::Duration) {
                return Decision::ask(Branch::ChestPain, CanonicalQuestion::Duration);
            }
            if open_bool(BoolSlot::PainWorseWithMove) {
                return Decision::ask(Branch::ChestPain, CanonicalQuestion::WorseMove);
            }
            if open_bool(BoolSlot::SobAtRest) {
                return Decision::ask(Branch::ChestPain, CanonicalQuestion::SobRest);
            }
        }

        if ctx.respiratory && open_bool(BoolSlot::SobAtRest) {
            return Decision::ask(Branch::Respiratory, CanonicalQuestion::SobRest);
        }

        if ctx.gastro && open_bool(BoolSlot::GiCombo) {
            return Decision::ask(Branch::Gastro, CanonicalQuestion::GiCombo);
        }

        if entities.associated.contains(&Associated::Sweat)
            && !store.is_asked(CanonicalQuestion::Sweat)
        {
            return Decision::ask(Branch::Sweating, CanonicalQuestion::Sweat);
        }

        let chest_done = ctx.chest
            && slots.has_duration()
            && slots.pain_worse_with_move.is_some()
            && slots.sob_at_rest.is_some();
        let respiratory_done = ctx.respiratory && slots.sob_at_rest.is_some();
        let gastro_done = ctx.gastro && slots.gi_combo.is_some();
        if chest_done || respiratory_done || gastro_done {
            return Decision::terminate(Branch::Completion);
        }

        if !store.is_asked(CanonicalQuestion::Clarify) {
            return Decision::ask(Branch::Clarification, CanonicalQuestion::Clarify);
        }

        for slot in [
            BoolSlot::PainWorseWithMove,
            BoolSlot::SobAtRest,
            BoolSlot::GiCombo,
        ] {
            if open_bool(slot) {
                return Decision::ask(Branch::ResidualSweep, slot.question());
            }
        }

        Decision::terminate(Branch::ForcedTermination)
    }
}
