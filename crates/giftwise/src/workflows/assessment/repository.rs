use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Answer, AssessmentResponse, GiftCategory, ResponseId, ResultId};
use super::expiration::ExpirationPolicy;
use super::scoring::ScoreResult;
use crate::workflows::access::UserId;

/// Stored result derived from a submitted response. Never user-editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    pub response_id: ResponseId,
    pub scores: BTreeMap<GiftCategory, u32>,
    pub top1: GiftCategory,
    pub top2: GiftCategory,
    pub top3: GiftCategory,
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn from_score(
        id: ResultId,
        response_id: ResponseId,
        score: &ScoreResult,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let [top1, top2, top3] = score.top3;
        Self {
            id,
            response_id,
            scores: score.totals.clone(),
            top1,
            top2,
            top3,
            is_valid: score.is_valid,
            warnings: score.error_messages(),
            created_at,
            expires_at,
        }
    }

    pub fn ranking(&self) -> [GiftCategory; 3] {
        [self.top1, self.top2, self.top3]
    }

    pub fn view(&self, expiration: &ExpirationPolicy, now: DateTime<Utc>) -> ResultView {
        let status = expiration.status(self.expires_at, now);
        ResultView {
            id: self.id.clone(),
            response_id: self.response_id.clone(),
            scores: self.scores.clone(),
            top3: self.ranking(),
            is_valid: self.is_valid,
            warnings: self.warnings.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_expired: status.is_expired,
            is_near_expiration: status.is_near_expiration,
            is_very_near_expiration: status.is_very_near_expiration,
            days_until_expiration: status.days_until_expiration,
            shareable: status.is_shareable(),
        }
    }
}

/// Result as exposed to its owner, with expiration flags computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub id: ResultId,
    pub response_id: ResponseId,
    pub scores: BTreeMap<GiftCategory, u32>,
    pub top3: [GiftCategory; 3],
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_expired: bool,
    pub is_near_expiration: bool,
    pub is_very_near_expiration: bool,
    pub days_until_expiration: i64,
    pub shareable: bool,
}

/// Storage abstraction for responses, answers, and results.
///
/// Implementations must make `mark_submitted` a one-time conditional transition
/// (`submitted_at IS NULL`) and keep at most one result per response; both report
/// `RepositoryError::Conflict` when the precondition fails.
pub trait AssessmentRepository: Send + Sync {
    fn insert_response(
        &self,
        response: AssessmentResponse,
    ) -> Result<AssessmentResponse, RepositoryError>;
    fn fetch_response(&self, id: &ResponseId)
        -> Result<Option<AssessmentResponse>, RepositoryError>;
    fn responses_for_user(&self, user_id: &UserId)
        -> Result<Vec<AssessmentResponse>, RepositoryError>;
    /// Appends to an open response; `Conflict` once it has been submitted.
    fn append_answers(&self, id: &ResponseId, answers: Vec<Answer>) -> Result<usize, RepositoryError>;
    fn answers(&self, id: &ResponseId) -> Result<Vec<Answer>, RepositoryError>;
    fn mark_submitted(
        &self,
        id: &ResponseId,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssessmentResponse, RepositoryError>;
    fn insert_result(&self, record: ResultRecord) -> Result<ResultRecord, RepositoryError>;
    fn fetch_result(&self, id: &ResultId) -> Result<Option<ResultRecord>, RepositoryError>;
    fn result_for_response(&self, id: &ResponseId)
        -> Result<Option<ResultRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or precondition failed")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
