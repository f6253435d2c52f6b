use chrono::{DateTime, Utc};
use giftwise::workflows::access::UserId;
use giftwise::workflows::assessment::{
    Answer, AssessmentRepository, AssessmentResponse, RepositoryError, ResponseId, ResultId,
    ResultRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct AssessmentTables {
    responses: HashMap<ResponseId, AssessmentResponse>,
    answers: HashMap<ResponseId, Vec<Answer>>,
    results: HashMap<ResultId, ResultRecord>,
    result_by_response: HashMap<ResponseId, ResultId>,
}

/// Single-process store backing the API until a relational repository is wired in.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    tables: Arc<Mutex<AssessmentTables>>,
}

impl InMemoryAssessmentRepository {
    fn lock(&self) -> Result<MutexGuard<'_, AssessmentTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert_response(
        &self,
        response: AssessmentResponse,
    ) -> Result<AssessmentResponse, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.responses.contains_key(&response.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .responses
            .insert(response.id.clone(), response.clone());
        Ok(response)
    }

    fn fetch_response(
        &self,
        id: &ResponseId,
    ) -> Result<Option<AssessmentResponse>, RepositoryError> {
        Ok(self.lock()?.responses.get(id).cloned())
    }

    fn responses_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AssessmentResponse>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .responses
            .values()
            .filter(|response| response.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    fn append_answers(
        &self,
        id: &ResponseId,
        answers: Vec<Answer>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.lock()?;
        let response = tables.responses.get(id).ok_or(RepositoryError::NotFound)?;
        if !response.is_open() {
            return Err(RepositoryError::Conflict);
        }
        let stored = tables.answers.entry(id.clone()).or_default();
        stored.extend(answers);
        Ok(stored.len())
    }

    fn answers(&self, id: &ResponseId) -> Result<Vec<Answer>, RepositoryError> {
        Ok(self.lock()?.answers.get(id).cloned().unwrap_or_default())
    }

    fn mark_submitted(
        &self,
        id: &ResponseId,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssessmentResponse, RepositoryError> {
        let mut tables = self.lock()?;
        let response = tables
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
        let mut tables = self.lock()?;
        if tables.result_by_response.contains_key(&record.response_id)
            || tables.results.contains_key(&record.id)
        {
            return Err(RepositoryError::Conflict);
        }
        tables
            .result_by_response
            .insert(record.response_id.clone(), record.id.clone());
        tables.results.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_result(&self, id: &ResultId) -> Result<Option<ResultRecord>, RepositoryError> {
        Ok(self.lock()?.results.get(id).cloned())
    }

    fn result_for_response(
        &self,
        id: &ResponseId,
    ) -> Result<Option<ResultRecord>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .result_by_response
            .get(id)
            .and_then(|result_id| tables.results.get(result_id))
            .cloned())
    }
}
