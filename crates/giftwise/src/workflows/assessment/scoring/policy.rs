use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::config::AssessmentConfig;

/// Likert bounds every answer is clamped into.
pub const ANSWER_VALUE_RANGE: RangeInclusive<i64> = 1..=5;

const DEFAULT_MINIMUM_ANSWERS_PER_GIFT: usize = 3;

/// Validity dial for the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub minimum_answers_per_gift: usize,
}

impl ScoringPolicy {
    pub fn new(minimum_answers_per_gift: usize) -> Self {
        Self {
            minimum_answers_per_gift,
        }
    }

    pub fn from_config(config: &AssessmentConfig) -> Self {
        Self::new(config.minimum_answers_per_gift)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_ANSWERS_PER_GIFT)
    }
}

pub(crate) fn clamp_value(value: i64) -> u32 {
    value.clamp(*ANSWER_VALUE_RANGE.start(), *ANSWER_VALUE_RANGE.end()) as u32
}
