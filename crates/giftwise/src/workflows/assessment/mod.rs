//! Spiritual-gifts questionnaire: answer intake, scoring, and the result lifecycle.

pub mod domain;
pub mod expiration;
pub mod import;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Answer, AssessmentResponse, GiftCategory, QuestionId, ResponseId, ResponseStatus, ResultId,
    VersionId,
};
pub use expiration::{ExpirationPolicy, ExpirationStatus};
pub use import::{load_answers, parse_answers, AnswerImportError};
pub use repository::{AssessmentRepository, RepositoryError, ResultRecord, ResultView};
pub use router::{assessment_router, AssessmentRouterState};
pub use scoring::{
    GiftScorer, ScoreResult, ScoreView, ScoringPolicy, ValidationIssue, NEUTRAL_RANKING,
};
pub use service::{AssessmentError, AssessmentPolicy, AssessmentService, SubmissionOutcome};
