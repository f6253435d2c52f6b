use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Answer, AssessmentResponse, ResponseId, ResponseStatus, ResultId, VersionId,
};
use super::expiration::ExpirationPolicy;
use super::repository::{AssessmentRepository, RepositoryError, ResultRecord, ResultView};
use super::scoring::{GiftScorer, ScoreResult, ScoringPolicy};
use crate::config::AssessmentConfig;
use crate::workflows::access::{OrganizationId, UserId};

/// Scoring and retention settings the lifecycle manager runs with.
#[derive(Debug, Clone, Default)]
pub struct AssessmentPolicy {
    pub scoring: ScoringPolicy,
    pub expiration: ExpirationPolicy,
    pub discard_malformed_answers: bool,
}

impl AssessmentPolicy {
    pub fn from_config(config: &AssessmentConfig) -> Self {
        Self {
            scoring: ScoringPolicy::from_config(config),
            expiration: ExpirationPolicy::from_config(config),
            discard_malformed_answers: config.discard_malformed_answers,
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub response: AssessmentResponse,
    pub result: ResultRecord,
    pub score: ScoreResult,
    pub recovered: bool,
}

/// Result lifecycle manager: owns the open → submitted → scored transitions.
pub struct AssessmentService<R> {
    repository: Arc<R>,
    scorer: GiftScorer,
    expiration: ExpirationPolicy,
    discard_malformed_answers: bool,
}

static RESPONSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RESULT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_response_id() -> ResponseId {
    let id = RESPONSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResponseId(format!("resp-{id:06}"))
}

fn next_result_id() -> ResultId {
    let id = RESULT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResultId(format!("result-{id:06}"))
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: AssessmentPolicy) -> Self {
        Self {
            repository,
            scorer: GiftScorer::new(policy.scoring),
            expiration: policy.expiration,
            discard_malformed_answers: policy.discard_malformed_answers,
        }
    }

    pub fn scorer(&self) -> &GiftScorer {
        &self.scorer
    }

    pub fn expiration(&self) -> &ExpirationPolicy {
        &self.expiration
    }

    /// Open a new response owned by `owner`.
    pub fn start(
        &self,
        owner: &UserId,
        organization_id: Option<OrganizationId>,
        version_id: VersionId,
        now: DateTime<Utc>,
    ) -> Result<AssessmentResponse, AssessmentError> {
        let response = AssessmentResponse {
            id: next_response_id(),
            user_id: owner.clone(),
            organization_id,
            version_id,
            started_at: now,
            submitted_at: None,
        };

        let stored = self.repository.insert_response(response)?;
        info!(response = %stored.id, owner = %owner, "assessment response started");
        Ok(stored)
    }

    /// Fetch a response, treating responses owned by someone else as missing.
    pub fn response(
        &self,
        owner: &UserId,
        response_id: &ResponseId,
    ) -> Result<AssessmentResponse, AssessmentError> {
        self.repository
            .fetch_response(response_id)?
            .filter(|response| response.is_owned_by(owner))
            .ok_or_else(|| AssessmentError::response_not_found(response_id))
    }

    /// Append answers to an open response; returns the number of answers now recorded.
    pub fn record_answers(
        &self,
        owner: &UserId,
        response_id: &ResponseId,
        answers: Vec<Answer>,
    ) -> Result<usize, AssessmentError> {
        let response = self.response(owner, response_id)?;
        if !response.is_open() {
            return Err(AssessmentError::already_submitted(response_id));
        }

        self.repository
            .append_answers(response_id, answers)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    AssessmentError::already_submitted(response_id)
                }
                other => other.into(),
            })
    }

    /// Submit and score a response. A second submit fails with `InvalidState` and
    /// never produces another result.
    pub fn submit(
        &self,
        owner: &UserId,
        response_id: &ResponseId,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, AssessmentError> {
        let response = self.response(owner, response_id)?;
        if !response.is_open() {
            return Err(AssessmentError::already_submitted(response_id));
        }

        let expires_at = self.expiration.expires_at(now).ok_or_else(|| {
            AssessmentError::ExpirationOutOfRange {
                response_id: response_id.clone(),
                validity_days: self.expiration.validity().num_days(),
            }
        })?;

        let submitted = self
            .repository
            .mark_submitted(response_id, now)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    AssessmentError::already_submitted(response_id)
                }
                other => other.into(),
            })?;

        let answers = self.repository.answers(response_id)?;
        let (score, recovered) = self.score_submission(response_id, &answers);

        let record = ResultRecord::from_score(
            next_result_id(),
            response_id.clone(),
            &score,
            now,
            expires_at,
        );
        let result = self
            .repository
            .insert_result(record)
            .map_err(|err| match err {
                RepositoryError::Conflict => AssessmentError::InvalidState {
                    response_id: response_id.clone(),
                    state: ResponseStatus::Scored,
                    expected: ResponseStatus::Submitted,
                },
                other => other.into(),
            })?;

        info!(
            response = %response_id,
            result = %result.id,
            top1 = %result.top1,
            valid = result.is_valid,
            recovered,
            "assessment response scored"
        );

        Ok(SubmissionOutcome {
            response: submitted,
            result,
            score,
            recovered,
        })
    }

    fn score_submission(&self, response_id: &ResponseId, answers: &[Answer]) -> (ScoreResult, bool) {
        let strict = self.scorer.score(answers);
        let needs_recovery = strict.scored_answers == 0
            || (self.discard_malformed_answers && strict.has_malformed_answers());

        if !needs_recovery {
            return (strict, false);
        }

        let recovered = self.scorer.recover(answers);
        warn!(
            response = %response_id,
            answers = answers.len(),
            neutral = recovered.is_neutral_fallback(),
            "scoring recovery invoked"
        );
        (recovered, true)
    }

    /// Stateless scoring for previews; nothing is persisted.
    pub fn preview(&self, answers: &[Answer], recover: bool) -> ScoreResult {
        if recover {
            self.scorer.recover(answers)
        } else {
            self.scorer.score(answers)
        }
    }

    pub fn status(
        &self,
        owner: &UserId,
        response_id: &ResponseId,
        now: DateTime<Utc>,
    ) -> Result<ResponseStatus, AssessmentError> {
        let response = self.response(owner, response_id)?;
        if response.is_open() {
            return Ok(ResponseStatus::Open);
        }

        let status = match self.repository.result_for_response(response_id)? {
            None => ResponseStatus::Submitted,
            Some(result) if self.expiration.status(result.expires_at, now).is_expired => {
                ResponseStatus::Expired
            }
            Some(_) => ResponseStatus::Scored,
        };
        Ok(status)
    }

    /// Fetch one result. Ownership is checked before expiration; foreign results are
    /// reported as missing.
    pub fn result(
        &self,
        owner: &UserId,
        result_id: &ResultId,
        now: DateTime<Utc>,
    ) -> Result<ResultView, AssessmentError> {
        let not_found = || AssessmentError::NotFound {
            entity: "result",
            id: result_id.0.clone(),
        };

        let record = self.repository.fetch_result(result_id)?.ok_or_else(not_found)?;
        let owned = self
            .repository
            .fetch_response(&record.response_id)?
            .is_some_and(|response| response.is_owned_by(owner));
        if !owned {
            return Err(not_found());
        }

        Ok(record.view(&self.expiration, now))
    }

    /// All results belonging to responses owned by `owner`, newest first.
    pub fn results_for_user(
        &self,
        owner: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResultView>, AssessmentError> {
        let mut views = Vec::new();
        for response in self.repository.responses_for_user(owner)? {
            if !response.is_owned_by(owner) {
                continue;
            }
            if let Some(record) = self.repository.result_for_response(&response.id)? {
                views.push(record.view(&self.expiration, now));
            }
        }

        views.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(views)
    }
}

/// Error raised by the assessment lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("response {response_id} is {state}; expected {expected}")]
    InvalidState {
        response_id: ResponseId,
        state: ResponseStatus,
        expected: ResponseStatus,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("result for response {response_id} cannot expire after {validity_days} days")]
    ExpirationOutOfRange {
        response_id: ResponseId,
        validity_days: i64,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssessmentError {
    fn already_submitted(response_id: &ResponseId) -> Self {
        AssessmentError::InvalidState {
            response_id: response_id.clone(),
            state: ResponseStatus::Submitted,
            expected: ResponseStatus::Open,
        }
    }

    fn response_not_found(response_id: &ResponseId) -> Self {
        AssessmentError::NotFound {
            entity: "response",
            id: response_id.0.clone(),
        }
    }
}
