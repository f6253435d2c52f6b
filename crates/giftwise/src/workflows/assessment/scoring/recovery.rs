use super::super::domain::{Answer, GiftCategory};
use super::policy::{ScoringPolicy, ANSWER_VALUE_RANGE};
use super::rules::score_answers;
use super::{ScoreResult, ValidationIssue};

fn is_well_formed(answer: &Answer) -> bool {
    GiftCategory::from_key(&answer.gift_key).is_some() && ANSWER_VALUE_RANGE.contains(&answer.value)
}

/// Second stage of the pipeline: drop malformed answers, score what remains, and fall
/// back to the neutral ranking when nothing usable is left.
pub(crate) fn recover(answers: &[Answer], policy: &ScoringPolicy) -> ScoreResult {
    let usable: Vec<Answer> = answers
        .iter()
        .filter(|answer| is_well_formed(answer))
        .cloned()
        .collect();
    let discarded = answers.len() - usable.len();

    if usable.is_empty() {
        let mut errors = Vec::new();
        if discarded > 0 {
            errors.push(ValidationIssue::DiscardedMalformed { count: discarded });
        } else {
            errors.push(ValidationIssue::NoAnswers);
        }
        errors.push(ValidationIssue::NeutralFallback);
        return ScoreResult::neutral(errors);
    }

    let mut result = score_answers(&usable, policy);
    if discarded > 0 {
        result
            .errors
            .insert(0, ValidationIssue::DiscardedMalformed { count: discarded });
        result.is_valid = false;
    }
    result
}
