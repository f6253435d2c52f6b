use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::access::{
    AccessService, InMemoryViewContextStore, OrganizationId, Principal, Role, StoreError,
    UserId, ViewContext, ViewContextStore,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn first_church() -> OrganizationId {
    OrganizationId("org-first-church".to_string())
}

pub(super) fn grace_chapel() -> OrganizationId {
    OrganizationId("org-grace-chapel".to_string())
}

pub(super) fn super_admin() -> Principal {
    Principal {
        id: UserId("user-admin".to_string()),
        role: Role::SuperAdmin,
        organization_id: None,
    }
}

pub(super) fn member_with(id: &str, role: Role, organization: OrganizationId) -> Principal {
    Principal {
        id: UserId(id.to_string()),
        role,
        organization_id: Some(organization),
    }
}

pub(super) fn context_for(
    principal: &Principal,
    role: Option<Role>,
    organization: Option<OrganizationId>,
    created_at: DateTime<Utc>,
) -> ViewContext {
    ViewContext {
        original_principal_id: principal.id.clone(),
        view_as_role: role,
        view_as_organization_id: organization,
        created_at,
    }
}

pub(super) fn build_access() -> (
    Arc<AccessService<InMemoryViewContextStore>>,
    Arc<InMemoryViewContextStore>,
) {
    let store = Arc::new(InMemoryViewContextStore::new());
    (Arc::new(AccessService::new(Arc::clone(&store))), store)
}

/// Store whose backend cannot be reached.
pub(super) struct OfflineStore;

impl ViewContextStore for OfflineStore {
    fn set(&self, _context: ViewContext) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }

    fn get(
        &self,
        _principal_id: &UserId,
        _now: DateTime<Utc>,
    ) -> Result<Option<ViewContext>, StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }

    fn clear(&self, _principal_id: &UserId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }
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
