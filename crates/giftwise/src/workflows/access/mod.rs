//! Effective-identity resolution for view-as support sessions and the role/permission gate.

pub mod gate;
pub mod identity;
pub mod roles;
pub mod router;
pub mod service;
pub mod view_context;

#[cfg(test)]
mod tests;

pub use gate::{authorize, require, AccessDecision, AccessError, DenyReason, ResourceScope};
pub use identity::{
    resolve_effective_identity, EffectiveIdentity, OrganizationId, Principal, UserId,
};
pub use roles::{Permission, Role, UnknownPermission, UnknownRole};
pub use router::{principal_from_headers, view_as_router, PrincipalHeaderError};
pub use service::{AccessService, ViewAsRequest, ViewAsState};
pub use view_context::{
    view_context_ttl, InMemoryViewContextStore, StoreError, ViewContext, ViewContextStore,
    VIEW_CONTEXT_TTL_HOURS,
};
