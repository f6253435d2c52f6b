//! Gift scoring as a two-stage pipeline.
//!
//! [`GiftScorer::score`] is the strict stage: it always produces a ranking and reports
//! malformed or thin input as [`ValidationIssue`]s. [`GiftScorer::recover`] is the
//! recovery stage callers opt into; it discards malformed answers and, when nothing
//! usable remains, returns [`NEUTRAL_RANKING`].

mod policy;
mod recovery;
mod rules;

pub use policy::{ScoringPolicy, ANSWER_VALUE_RANGE};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Answer, GiftCategory, QuestionId};

/// Ranking reported when no usable answers exist at all.
pub const NEUTRAL_RANKING: [GiftCategory; 3] = [
    GiftCategory::LeadershipOrg,
    GiftCategory::Teaching,
    GiftCategory::WisdomInsight,
];

/// Stateless scorer applying a [`ScoringPolicy`].
#[derive(Debug, Clone, Default)]
pub struct GiftScorer {
    policy: ScoringPolicy,
}

impl GiftScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn score(&self, answers: &[Answer]) -> ScoreResult {
        rules::score_answers(answers, &self.policy)
    }

    pub fn recover(&self, answers: &[Answer]) -> ScoreResult {
        recovery::recover(answers, &self.policy)
    }
}

/// Scorer output. `is_valid == false` still carries a usable ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub totals: BTreeMap<GiftCategory, u32>,
    pub top3: [GiftCategory; 3],
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub scored_answers: usize,
}

impl ScoreResult {
    pub(crate) fn neutral(errors: Vec<ValidationIssue>) -> Self {
        Self {
            totals: rules::zeroed_totals(),
            top3: NEUTRAL_RANKING,
            is_valid: false,
            errors,
            scored_answers: 0,
        }
    }

    pub fn total_for(&self, category: GiftCategory) -> u32 {
        self.totals.get(&category).copied().unwrap_or(0)
    }

    pub fn grand_total(&self) -> u32 {
        self.totals.values().sum()
    }

    /// True when an answer had an unknown key or an out-of-range value.
    pub fn has_malformed_answers(&self) -> bool {
        self.errors.iter().any(ValidationIssue::is_malformed_answer)
    }

    pub fn is_neutral_fallback(&self) -> bool {
        self.errors.contains(&ValidationIssue::NeutralFallback)
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn view(&self) -> ScoreView {
        ScoreView {
            totals: self.totals.clone(),
            top3: self.top3,
            is_valid: self.is_valid,
            errors: self.error_messages(),
        }
    }
}

/// Presentation shape of a score: `{ totals, top3, is_valid, errors }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreView {
    pub totals: BTreeMap<GiftCategory, u32>,
    pub top3: [GiftCategory; 3],
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Diagnostics attached to a score. These are data, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("no answers were provided")]
    NoAnswers,
    #[error("question {question_id} references unknown gift '{gift_key}'")]
    UnknownGift {
        question_id: QuestionId,
        gift_key: String,
    },
    #[error("question {question_id} has value {value} outside 1..=5; clamped")]
    ValueOutOfRange { question_id: QuestionId, value: i64 },
    #[error("{} gift(s) have fewer than {required} answers: {}", .categories.len(), join_keys(.categories))]
    InsufficientCoverage {
        categories: Vec<GiftCategory>,
        required: usize,
    },
    #[error("discarded {count} malformed answer(s)")]
    DiscardedMalformed { count: usize },
    #[error("no usable answers; reporting the neutral default ranking")]
    NeutralFallback,
}

impl ValidationIssue {
    pub fn is_malformed_answer(&self) -> bool {
        matches!(
            self,
            ValidationIssue::UnknownGift { .. } | ValidationIssue::ValueOutOfRange { .. }
        )
    }
}

fn join_keys(categories: &[GiftCategory]) -> String {
    categories
        .iter()
        .map(|category| category.key())
        .collect::<Vec<_>>()
        .join(", ")
}
