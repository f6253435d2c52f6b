use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{Answer, AssessmentResponse, ResponseId, ResponseStatus, ResultId, VersionId};
use super::repository::{AssessmentRepository, ResultView};
use super::scoring::ScoreView;
use super::service::AssessmentService;
use crate::error::AppError;
use crate::workflows::access::{
    principal_from_headers, require, AccessService, OrganizationId, Permission, ResourceScope,
    ViewContextStore,
};

/// Shared handler state: the lifecycle manager plus identity resolution.
pub struct AssessmentRouterState<R, S> {
    pub assessments: Arc<AssessmentService<R>>,
    pub access: Arc<AccessService<S>>,
}

impl<R, S> Clone for AssessmentRouterState<R, S> {
    fn clone(&self) -> Self {
        Self {
            assessments: Arc::clone(&self.assessments),
            access: Arc::clone(&self.access),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartResponseRequest {
    pub version_id: VersionId,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswersRequest {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Serialize)]
pub struct RecordAnswersResponse {
    pub response_id: ResponseId,
    pub answers_recorded: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub result: ResultView,
    pub score: ScoreView,
    pub recovered: bool,
}

#[derive(Debug, Serialize)]
pub struct ResponseStatusView {
    pub response_id: ResponseId,
    pub status: ResponseStatus,
}

#[derive(Debug, Deserialize)]
pub struct ScorePreviewRequest {
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub recover: bool,
}

/// Router builder exposing the assessment lifecycle over HTTP.
pub fn assessment_router<R, S>(
    assessments: Arc<AssessmentService<R>>,
    access: Arc<AccessService<S>>,
) -> Router
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments/responses",
            post(start_handler::<R, S>),
        )
        .route(
            "/api/v1/assessments/responses/:response_id",
            get(status_handler::<R, S>),
        )
        .route(
            "/api/v1/assessments/responses/:response_id/answers",
            post(record_answers_handler::<R, S>),
        )
        .route(
            "/api/v1/assessments/responses/:response_id/submit",
            post(submit_handler::<R, S>),
        )
        .route("/api/v1/assessments/results", get(results_handler::<R, S>))
        .route(
            "/api/v1/assessments/results/:result_id",
            get(result_handler::<R, S>),
        )
        .route("/api/v1/assessments/score", post(score_handler::<R, S>))
        .with_state(AssessmentRouterState {
            assessments,
            access,
        })
}

pub(crate) async fn start_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Json(request): Json<StartResponseRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>), AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let now = Utc::now();
    let identity = state.access.resolve(&principal, now)?;

    let organization_id = request
        .organization_id
        .or_else(|| identity.organization_id.clone());
    let scope = ResourceScope::for_organization(organization_id.clone());
    require(&identity, Permission::AssessmentsTake, &scope)?;

    let response =
        state
            .assessments
            .start(&principal.id, organization_id, request.version_id, now)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub(crate) async fn record_answers_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Path(response_id): Path<String>,
    Json(request): Json<RecordAnswersRequest>,
) -> Result<Json<RecordAnswersResponse>, AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let response_id = ResponseId(response_id);

    let response = state.assessments.response(&principal.id, &response_id)?;
    let scope = ResourceScope::for_organization(response.organization_id);
    state
        .access
        .require(&principal, Permission::AssessmentsTake, &scope, Utc::now())?;

    let answers_recorded =
        state
            .assessments
            .record_answers(&principal.id, &response_id, request.answers)?;

    Ok(Json(RecordAnswersResponse {
        response_id,
        answers_recorded,
    }))
}

pub(crate) async fn submit_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Path(response_id): Path<String>,
) -> Result<(StatusCode, Json<SubmissionView>), AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let now = Utc::now();
    let response_id = ResponseId(response_id);

    let response = state.assessments.response(&principal.id, &response_id)?;
    let scope = ResourceScope::for_organization(response.organization_id);
    state
        .access
        .require(&principal, Permission::AssessmentsTake, &scope, now)?;

    let outcome = state.assessments.submit(&principal.id, &response_id, now)?;
    let view = SubmissionView {
        result: outcome.result.view(state.assessments.expiration(), now),
        score: outcome.score.view(),
        recovered: outcome.recovered,
    };
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn status_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Path(response_id): Path<String>,
) -> Result<Json<ResponseStatusView>, AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let response_id = ResponseId(response_id);
    let status = state
        .assessments
        .status(&principal.id, &response_id, Utc::now())?;
    Ok(Json(ResponseStatusView {
        response_id,
        status,
    }))
}

pub(crate) async fn results_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ResultView>>, AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let results = state
        .assessments
        .results_for_user(&principal.id, Utc::now())?;
    Ok(Json(results))
}

pub(crate) async fn result_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Path(result_id): Path<String>,
) -> Result<Json<ResultView>, AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let result = state
        .assessments
        .result(&principal.id, &ResultId(result_id), Utc::now())?;
    Ok(Json(result))
}

pub(crate) async fn score_handler<R, S>(
    State(state): State<AssessmentRouterState<R, S>>,
    headers: HeaderMap,
    Json(request): Json<ScorePreviewRequest>,
) -> Result<Json<ScoreView>, AppError>
where
    R: AssessmentRepository + 'static,
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    state.access.require(
        &principal,
        Permission::AssessmentsTake,
        &ResourceScope::Global,
        Utc::now(),
    )?;

    let score = state.assessments.preview(&request.answers, request.recover);
    Ok(Json(score.view()))
}
