use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{OrganizationId, Principal, UserId};
use super::roles::Role;

/// Hard lifetime of a view-as override.
pub const VIEW_CONTEXT_TTL_HOURS: i64 = 24;

pub fn view_context_ttl() -> Duration {
    Duration::hours(VIEW_CONTEXT_TTL_HOURS)
}

/// Transient override recorded while a super administrator views the platform as
/// another role and/or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewContext {
    pub original_principal_id: UserId,
    pub view_as_role: Option<Role>,
    pub view_as_organization_id: Option<OrganizationId>,
    pub created_at: DateTime<Utc>,
}

impl ViewContext {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + view_context_ttl()
    }

    /// Expired once the context is strictly older than the TTL.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > view_context_ttl()
    }

    pub fn applies_to(&self, principal: &Principal, now: DateTime<Utc>) -> bool {
        self.original_principal_id == principal.id
            && principal.role == Role::SuperAdmin
            && !self.is_expired(now)
    }
}

/// Server-side source of truth for view-as overrides, keyed by principal.
///
/// `set` is last-write-wins per principal, `clear` is idempotent, and `get` lazily
/// drops contexts that have outlived [`VIEW_CONTEXT_TTL_HOURS`].
pub trait ViewContextStore: Send + Sync {
    fn set(&self, context: ViewContext) -> Result<(), StoreError>;
    fn get(
        &self,
        principal_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ViewContext>, StoreError>;
    fn clear(&self, principal_id: &UserId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("view context store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store; suitable for a single API instance and for tests.
#[derive(Debug, Default)]
pub struct InMemoryViewContextStore {
    contexts: Mutex<HashMap<UserId, ViewContext>>,
}

impl InMemoryViewContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<UserId, ViewContext>>, StoreError> {
        self.contexts
            .lock()
            .map_err(|_| StoreError::Unavailable("view context mutex poisoned".to_string()))
    }
}

impl ViewContextStore for InMemoryViewContextStore {
    fn set(&self, context: ViewContext) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.insert(context.original_principal_id.clone(), context);
        Ok(())
    }

    fn get(
        &self,
        principal_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ViewContext>, StoreError> {
        let mut guard = self.lock()?;
        if guard
            .get(principal_id)
            .is_some_and(|context| context.is_expired(now))
        {
            guard.remove(principal_id);
            return Ok(None);
        }
        Ok(guard.get(principal_id).cloned())
    }

    fn clear(&self, principal_id: &UserId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.remove(principal_id);
        Ok(())
    }
}
