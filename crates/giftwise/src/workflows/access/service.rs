use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::gate::{self, AccessDecision, AccessError, ResourceScope};
use super::identity::{resolve_effective_identity, EffectiveIdentity, OrganizationId, Principal};
use super::roles::{Permission, Role};
use super::view_context::{ViewContext, ViewContextStore};

/// Requested override when a super administrator starts viewing as someone else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAsRequest {
    #[serde(default, alias = "viewAsRole")]
    pub view_as_role: Option<Role>,
    #[serde(default, alias = "viewAsOrganizationId")]
    pub view_as_organization_id: Option<OrganizationId>,
}

/// Effective identity together with the override backing it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewAsState {
    pub identity: EffectiveIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ViewContext>,
}

/// Service composing the view-context store, identity resolution, and the gate.
pub struct AccessService<S> {
    store: Arc<S>,
}

impl<S> AccessService<S>
where
    S: ViewContextStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve the effective identity for this request, discarding stale overrides.
    pub fn resolve(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<EffectiveIdentity, AccessError> {
        Ok(self.view_state(principal, now)?.identity)
    }

    pub fn view_state(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<ViewAsState, AccessError> {
        let stored = self.store.get(&principal.id, now)?;

        let context = match stored {
            Some(context) if context.applies_to(principal, now) => Some(context),
            Some(context) => {
                warn!(
                    principal = %principal.id,
                    role = %principal.role,
                    owner = %context.original_principal_id,
                    "discarding view context that no longer applies"
                );
                self.store.clear(&principal.id)?;
                None
            }
            None => None,
        };

        let identity = resolve_effective_identity(principal, context.as_ref(), now);
        Ok(ViewAsState { identity, context })
    }

    /// Replace any existing override for the principal. Only super administrators may
    /// view as another role or organization.
    pub fn set_view(
        &self,
        principal: &Principal,
        request: ViewAsRequest,
        now: DateTime<Utc>,
    ) -> Result<ViewAsState, AccessError> {
        if !principal.role.has_permission(Permission::ViewAs) {
            warn!(
                principal = %principal.id,
                role = %principal.role,
                "rejected view-as request from non super administrator"
            );
            return Err(AccessError::Permission {
                role: principal.role,
                permission: Permission::ViewAs,
            });
        }

        if request.view_as_role.is_none() && request.view_as_organization_id.is_none() {
            return Err(AccessError::EmptyViewContext);
        }

        let context = ViewContext {
            original_principal_id: principal.id.clone(),
            view_as_role: request.view_as_role,
            view_as_organization_id: request.view_as_organization_id,
            created_at: now,
        };
        self.store.set(context.clone())?;

        info!(
            principal = %principal.id,
            view_as_role = ?context.view_as_role,
            view_as_organization = ?context.view_as_organization_id,
            expires_at = %context.expires_at(),
            "view context established"
        );

        let identity = resolve_effective_identity(principal, Some(&context), now);
        Ok(ViewAsState {
            identity,
            context: Some(context),
        })
    }

    pub fn clear_view(&self, principal: &Principal) -> Result<(), AccessError> {
        self.store.clear(&principal.id)?;
        info!(principal = %principal.id, "view context cleared");
        Ok(())
    }

    pub fn authorize(
        &self,
        principal: &Principal,
        action: Permission,
        scope: &ResourceScope,
        now: DateTime<Utc>,
    ) -> Result<(EffectiveIdentity, AccessDecision), AccessError> {
        let identity = self.resolve(principal, now)?;
        let decision = gate::authorize(&identity, action, scope);
        if let AccessDecision::Deny { reason } = &decision {
            debug!(
                principal = %principal.id,
                effective_role = %identity.role,
                impersonating = identity.is_impersonating(),
                ?reason,
                "authorization denied"
            );
        }
        Ok((identity, decision))
    }

    /// Resolve and enforce in one step, returning the identity that passed the gate.
    pub fn require(
        &self,
        principal: &Principal,
        action: Permission,
        scope: &ResourceScope,
        now: DateTime<Utc>,
    ) -> Result<EffectiveIdentity, AccessError> {
        let (identity, decision) = self.authorize(principal, action, scope, now)?;
        match decision {
            AccessDecision::Allow => Ok(identity),
            AccessDecision::Deny { reason } => Err(reason.into()),
        }
    }
}
