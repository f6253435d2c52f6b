use serde::{Deserialize, Serialize};

use super::identity::{EffectiveIdentity, OrganizationId};
use super::roles::{Permission, Role};
use super::view_context::StoreError;

/// Resource an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "organization_id", rename_all = "snake_case")]
pub enum ResourceScope {
    Global,
    Organization(OrganizationId),
}

impl ResourceScope {
    pub fn for_organization(organization_id: Option<OrganizationId>) -> Self {
        organization_id.map_or(ResourceScope::Global, ResourceScope::Organization)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny { reason: DenyReason },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Machine-readable deny reason so callers can render distinct messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenyReason {
    InsufficientRole {
        role: Role,
        permission: Permission,
    },
    OrganizationMismatch {
        required: OrganizationId,
        actual: Option<OrganizationId>,
    },
}

/// Decide whether the effective identity may perform `action` against `scope`.
///
/// Role permissions are checked before scope. A super administrator without an
/// organization override skips the scope check; once an organization is assumed
/// through view-as, that organization binds like any member's.
pub fn authorize(
    identity: &EffectiveIdentity,
    action: Permission,
    scope: &ResourceScope,
) -> AccessDecision {
    if !identity.role.has_permission(action) {
        return AccessDecision::Deny {
            reason: DenyReason::InsufficientRole {
                role: identity.role,
                permission: action,
            },
        };
    }

    let ResourceScope::Organization(required) = scope else {
        return AccessDecision::Allow;
    };

    if identity.role == Role::SuperAdmin && !identity.organization_overridden {
        return AccessDecision::Allow;
    }

    if identity.organization_id.as_ref() == Some(required) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny {
            reason: DenyReason::OrganizationMismatch {
                required: required.clone(),
                actual: identity.organization_id.clone(),
            },
        }
    }
}

/// Like [`authorize`], but turns a deny into an [`AccessError`].
pub fn require(
    identity: &EffectiveIdentity,
    action: Permission,
    scope: &ResourceScope,
) -> Result<(), AccessError> {
    match authorize(identity, action, scope) {
        AccessDecision::Allow => Ok(()),
        AccessDecision::Deny { reason } => Err(reason.into()),
    }
}

/// Errors raised while resolving identities or enforcing access.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("role {role} lacks permission {permission}")]
    Permission { role: Role, permission: Permission },
    #[error("organization scope does not cover resources of organization {required}")]
    OrganizationMismatch {
        required: OrganizationId,
        actual: Option<OrganizationId>,
    },
    #[error("view context must override a role or an organization")]
    EmptyViewContext,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DenyReason> for AccessError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::InsufficientRole { role, permission } => {
                AccessError::Permission { role, permission }
            }
            DenyReason::OrganizationMismatch { required, actual } => {
                AccessError::OrganizationMismatch { required, actual }
            }
        }
    }
}
