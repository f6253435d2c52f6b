use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::gate::{AccessDecision, DenyReason, ResourceScope};
use super::identity::{EffectiveIdentity, OrganizationId, Principal, UserId};
use super::roles::{Permission, Role};
use super::service::{AccessService, ViewAsRequest, ViewAsState};
use super::view_context::ViewContextStore;
use crate::error::AppError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";
pub const PRINCIPAL_ORGANIZATION_HEADER: &str = "x-principal-organization";

/// Problems reading the principal injected by the upstream auth layer.
#[derive(Debug, thiserror::Error)]
pub enum PrincipalHeaderError {
    #[error("missing or empty {0} header")]
    Missing(&'static str),
    #[error("header {header} is not valid: {value}")]
    Invalid { header: &'static str, value: String },
}

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, PrincipalHeaderError> {
    let id = header_value(headers, PRINCIPAL_ID_HEADER)?
        .ok_or(PrincipalHeaderError::Missing(PRINCIPAL_ID_HEADER))?;
    let raw_role = header_value(headers, PRINCIPAL_ROLE_HEADER)?
        .ok_or(PrincipalHeaderError::Missing(PRINCIPAL_ROLE_HEADER))?;
    let role = raw_role
        .parse::<Role>()
        .map_err(|_| PrincipalHeaderError::Invalid {
            header: PRINCIPAL_ROLE_HEADER,
            value: raw_role.clone(),
        })?;
    let organization_id = header_value(headers, PRINCIPAL_ORGANIZATION_HEADER)?.map(OrganizationId);

    Ok(Principal {
        id: UserId(id),
        role,
        organization_id,
    })
}

fn header_value(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<Option<String>, PrincipalHeaderError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|_| PrincipalHeaderError::Invalid {
        header: name,
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub permission: Permission,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    pub identity: EffectiveIdentity,
}

/// Router exposing the view-as lifecycle and authorization checks.
pub fn view_as_router<S>(access: Arc<AccessService<S>>) -> Router
where
    S: ViewContextStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/view-as",
            get(current_view_handler::<S>)
                .put(set_view_handler::<S>)
                .delete(clear_view_handler::<S>),
        )
        .route("/api/v1/authorize", post(authorize_handler::<S>))
        .with_state(access)
}

pub(crate) async fn current_view_handler<S>(
    State(access): State<Arc<AccessService<S>>>,
    headers: HeaderMap,
) -> Result<Json<ViewAsState>, AppError>
where
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let state = access.view_state(&principal, Utc::now())?;
    Ok(Json(state))
}

pub(crate) async fn set_view_handler<S>(
    State(access): State<Arc<AccessService<S>>>,
    headers: HeaderMap,
    Json(request): Json<ViewAsRequest>,
) -> Result<Json<ViewAsState>, AppError>
where
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let state = access.set_view(&principal, request, Utc::now())?;
    Ok(Json(state))
}

pub(crate) async fn clear_view_handler<S>(
    State(access): State<Arc<AccessService<S>>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError>
where
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    access.clear_view(&principal)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn authorize_handler<S>(
    State(access): State<Arc<AccessService<S>>>,
    headers: HeaderMap,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, AppError>
where
    S: ViewContextStore + 'static,
{
    let principal = principal_from_headers(&headers)?;
    let scope = ResourceScope::for_organization(request.organization_id);
    let (identity, decision) = access.authorize(&principal, request.permission, &scope, Utc::now())?;

    let (allowed, reason) = match decision {
        AccessDecision::Allow => (true, None),
        AccessDecision::Deny { reason } => (false, Some(reason)),
    };

    Ok(Json(AuthorizeResponse {
        allowed,
        reason,
        identity,
    }))
}
