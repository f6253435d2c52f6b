use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::access::{
    InMemoryViewContextStore, OrganizationId, Principal, Role, UserId,
};
use crate::workflows::assessment::domain::{
    Answer, AssessmentResponse, ResponseId, ResultId, VersionId,
};
use crate::workflows::assessment::repository::{
    AssessmentRepository, RepositoryError, ResultRecord,
};
use crate::workflows::assessment::service::{AssessmentPolicy, AssessmentService};
use crate::workflows::access::AccessService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 2, 15, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn member() -> UserId {
    UserId("user-grace".to_string())
}

pub(super) fn other_member() -> UserId {
    UserId("user-silas".to_string())
}

pub(super) fn congregation() -> OrganizationId {
    OrganizationId("org-first-church".to_string())
}

pub(super) fn version() -> VersionId {
    VersionId("gifts-v2".to_string())
}

pub(super) fn participant(id: UserId) -> Principal {
    Principal {
        id,
        role: Role::Participant,
        organization_id: Some(congregation()),
    }
}

/// Teaching answered high and faith answered evenly, three questions each.
pub(super) fn teaching_and_faith_answers() -> Vec<Answer> {
    vec![
        Answer::new("q1", "TEACHING", 5),
        Answer::new("q2", "TEACHING", 4),
        Answer::new("q3", "TEACHING", 5),
        Answer::new("q4", "FAITH", 3),
        Answer::new("q5", "FAITH", 3),
        Answer::new("q6", "FAITH", 3),
    ]
}

/// Three answers for every category, so coverage is satisfied.
pub(super) fn full_answer_sheet() -> Vec<Answer> {
    let mut answers = Vec::new();
    let mut question = 1;
    for (index, category) in crate::workflows::assessment::GiftCategory::ALL
        .iter()
        .enumerate()
    {
        for offset in 0..3 {
            let value = ((index + offset) % 5 + 1) as i64;
            answers.push(Answer::new(format!("q{question}"), category.key(), value));
            question += 1;
        }
    }
    answers
}

#[derive(Default)]
struct MemoryState {
    responses: HashMap<ResponseId, AssessmentResponse>,
    answers: HashMap<ResponseId, Vec<Answer>>,
    results: HashMap<ResultId, ResultRecord>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn result_count(&self) -> usize {
        self.state.lock().expect("repository mutex poisoned").results.len()
    }

    /// Backdate a stored result so expiration can be exercised.
    pub(super) fn age_result(&self, id: &ResultId, by: chrono::Duration) {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let record = guard.results.get_mut(id).expect("result present");
        record.created_at -= by;
        record.expires_at -= by;
    }
}

impl AssessmentRepository for MemoryRepository {
    fn insert_response(
        &self,
        response: AssessmentResponse,
    ) -> Result<AssessmentResponse, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.responses.contains_key(&response.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.responses.insert(response.id.clone(), response.clone());
        Ok(response)
    }

    fn fetch_response(
        &self,
        id: &ResponseId,
    ) -> Result<Option<AssessmentResponse>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.responses.get(id).cloned())
    }

    fn responses_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AssessmentResponse>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .responses
            .values()
            .filter(|response| &response.user_id == user_id)
            .cloned()
            .collect())
    }

    fn append_answers(
        &self,
        id: &ResponseId,
        answers: Vec<Answer>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        match guard.responses.get(id) {
            None => return Err(RepositoryError::NotFound),
            Some(response) if !response.is_open() => return Err(RepositoryError::Conflict),
            Some(_) => {}
        }
        let stored = guard.answers.entry(id.clone()).or_default();
        stored.extend(answers);
        Ok(stored.len())
    }

    fn answers(&self, id: &ResponseId) -> Result<Vec<Answer>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.answers.get(id).cloned().unwrap_or_default())
    }

    fn mark_submitted(
        &self,
        id: &ResponseId,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssessmentResponse, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let response = guard
            .responses
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if response.submitted_at.is_some() {
            return Err(RepositoryError::Conflict);
        }
        response.submitted_at = Some(submitted_at);
        Ok(response.clone())
    }

    fn insert_result(&self, record: ResultRecord) -> Result<ResultRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard
            .results
            .values()
            .any(|existing| existing.response_id == record.response_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.results.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_result(&self, id: &ResultId) -> Result<Option<ResultRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.results.get(id).cloned())
    }

    fn result_for_response(
        &self,
        id: &ResponseId,
    ) -> Result<Option<ResultRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .results
            .values()
            .find(|record| &record.response_id == id)
            .cloned())
    }
}

/// Repository whose backing store is down.
pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert_response(
        &self,
        _response: AssessmentResponse,
    ) -> Result<AssessmentResponse, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_response(
        &self,
        _id: &ResponseId,
    ) -> Result<Option<AssessmentResponse>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn responses_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<AssessmentResponse>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_answers(
        &self,
        _id: &ResponseId,
        _answers: Vec<Answer>,
    ) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn answers(&self, _id: &ResponseId) -> Result<Vec<Answer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_submitted(
        &self,
        _id: &ResponseId,
        _submitted_at: DateTime<Utc>,
    ) -> Result<AssessmentResponse, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_result(&self, _record: ResultRecord) -> Result<ResultRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_result(&self, _id: &ResultId) -> Result<Option<ResultRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn result_for_response(
        &self,
        _id: &ResponseId,
    ) -> Result<Option<ResultRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (Arc<AssessmentService<MemoryRepository>>, MemoryRepository) {
    build_service_with(AssessmentPolicy::default())
}

pub(super) fn build_service_with(
    policy: AssessmentPolicy,
) -> (Arc<AssessmentService<MemoryRepository>>, MemoryRepository) {
    let repository = MemoryRepository::default();
    let service = Arc::new(AssessmentService::new(Arc::new(repository.clone()), policy));
    (service, repository)
}

pub(super) fn build_access() -> Arc<AccessService<InMemoryViewContextStore>> {
    Arc::new(AccessService::new(Arc::new(InMemoryViewContextStore::new())))
}

/// Start a response for `owner` and record `answers` against it.
pub(super) fn open_response_with(
    service: &AssessmentService<MemoryRepository>,
    owner: &UserId,
    answers: Vec<Answer>,
) -> ResponseId {
    let response = service
        .start(owner, Some(congregation()), version(), now())
        .expect("response starts");
    service
        .record_answers(owner, &response.id, answers)
        .expect("answers recorded");
    response.id
}

pub(super) fn principal_request(
    method: &str,
    uri: &str,
    principal: &Principal,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-principal-id", principal.id.0.as_str())
        .header("x-principal-role", principal.role.key());
    if let Some(organization) = &principal.organization_id {
        builder = builder.header("x-principal-organization", organization.0.as_str());
    }

    match body {
        Some(json) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
