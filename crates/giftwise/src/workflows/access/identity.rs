use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::roles::Role;
use super::view_context::ViewContext;

/// Identifier wrapper for authenticated users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for tenant organizations (churches).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user as supplied by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

/// The (role, organization) pair used for authorization after any view-as override.
///
/// Never persisted; recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveIdentity {
    pub principal_id: UserId,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub role_overridden: bool,
    pub organization_overridden: bool,
}

impl EffectiveIdentity {
    /// Identity equal to the principal's own role and organization.
    pub fn of(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id.clone(),
            role: principal.role,
            organization_id: principal.organization_id.clone(),
            role_overridden: false,
            organization_overridden: false,
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.role_overridden || self.organization_overridden
    }
}

/// Resolve the effective identity for a principal and an optional stored view context.
///
/// The context only applies when it belongs to the principal, has not outlived its
/// TTL, and the principal is still a super administrator.
pub fn resolve_effective_identity(
    principal: &Principal,
    context: Option<&ViewContext>,
    now: DateTime<Utc>,
) -> EffectiveIdentity {
    let Some(context) = context.filter(|context| context.applies_to(principal, now)) else {
        return EffectiveIdentity::of(principal);
    };

    EffectiveIdentity {
        principal_id: principal.id.clone(),
        role: context.view_as_role.unwrap_or(principal.role),
        organization_id: context
            .view_as_organization_id
            .clone()
            .or_else(|| principal.organization_id.clone()),
        role_overridden: context.view_as_role.is_some(),
        organization_overridden: context.view_as_organization_id.is_some(),
    }
}
