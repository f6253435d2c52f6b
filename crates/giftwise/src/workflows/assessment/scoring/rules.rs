use std::collections::BTreeMap;

use super::super::domain::{Answer, GiftCategory};
use super::policy::{clamp_value, ScoringPolicy, ANSWER_VALUE_RANGE};
use super::{ScoreResult, ValidationIssue};

pub(crate) fn score_answers(answers: &[Answer], policy: &ScoringPolicy) -> ScoreResult {
    let mut totals = zeroed_totals();
    let mut counts: BTreeMap<GiftCategory, usize> =
        GiftCategory::ALL.iter().map(|category| (*category, 0)).collect();
    let mut errors = Vec::new();
    let mut scored_answers = 0;

    if answers.is_empty() {
        errors.push(ValidationIssue::NoAnswers);
    }

    for answer in answers {
        let Some(category) = GiftCategory::from_key(&answer.gift_key) else {
            errors.push(ValidationIssue::UnknownGift {
                question_id: answer.question_id.clone(),
                gift_key: answer.gift_key.clone(),
            });
            continue;
        };

        if !ANSWER_VALUE_RANGE.contains(&answer.value) {
            errors.push(ValidationIssue::ValueOutOfRange {
                question_id: answer.question_id.clone(),
                value: answer.value,
            });
        }

        *totals.entry(category).or_insert(0) += clamp_value(answer.value);
        *counts.entry(category).or_insert(0) += 1;
        scored_answers += 1;
    }

    if !answers.is_empty() {
        let under_covered: Vec<GiftCategory> = counts
            .iter()
            .filter(|(_, count)| **count < policy.minimum_answers_per_gift)
            .map(|(category, _)| *category)
            .collect();

        if !under_covered.is_empty() {
            errors.push(ValidationIssue::InsufficientCoverage {
                categories: under_covered,
                required: policy.minimum_answers_per_gift,
            });
        }
    }

    let top3 = rank(&totals);

    ScoreResult {
        totals,
        top3,
        is_valid: errors.is_empty(),
        errors,
        scored_answers,
    }
}

pub(crate) fn zeroed_totals() -> BTreeMap<GiftCategory, u32> {
    GiftCategory::ALL
        .iter()
        .map(|category| (*category, 0))
        .collect()
}

/// Descending total, declaration order on ties.
pub(crate) fn rank(totals: &BTreeMap<GiftCategory, u32>) -> [GiftCategory; 3] {
    let mut ordered: Vec<(GiftCategory, u32)> = GiftCategory::ALL
        .iter()
        .map(|category| (*category, totals.get(category).copied().unwrap_or(0)))
        .collect();

    ordered.sort_by(|(left, left_total), (right, right_total)| {
        right_total.cmp(left_total).then_with(|| left.cmp(right))
    });

    [ordered[0].0, ordered[1].0, ordered[2].0]
}
