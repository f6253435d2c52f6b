use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform roles ordered from least to most privileged.
///
/// The derived `Ord` follows the declaration order, so comparisons double as
/// hierarchy checks: `Role::OrgAdmin > Role::OrgLeader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Participant = 0,
    OrgViewer = 1,
    OrgLeader = 2,
    OrgAdmin = 3,
    OrgOwner = 4,
    SuperAdmin = 5,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Participant,
        Role::OrgViewer,
        Role::OrgLeader,
        Role::OrgAdmin,
        Role::OrgOwner,
        Role::SuperAdmin,
    ];

    pub const fn rank(self) -> u8 {
        self as u8
    }

    pub const fn key(self) -> &'static str {
        match self {
            Role::Participant => "PARTICIPANT",
            Role::OrgViewer => "ORG_VIEWER",
            Role::OrgLeader => "ORG_LEADER",
            Role::OrgAdmin => "ORG_ADMIN",
            Role::OrgOwner => "ORG_OWNER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Participant => "Participant",
            Role::OrgViewer => "Viewer",
            Role::OrgLeader => "Leader",
            Role::OrgAdmin => "Administrator",
            Role::OrgOwner => "Owner",
            Role::SuperAdmin => "Super Administrator",
        }
    }

    /// Permission table for the role. `SuperAdmin` holds every permission.
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Role::SuperAdmin => &Permission::ALL,
            Role::OrgOwner => ORG_OWNER_PERMISSIONS,
            Role::OrgAdmin => ORG_ADMIN_PERMISSIONS,
            Role::OrgLeader => ORG_LEADER_PERMISSIONS,
            Role::OrgViewer => ORG_VIEWER_PERMISSIONS,
            Role::Participant => PARTICIPANT_PERMISSIONS,
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self == Role::SuperAdmin || self.permissions().contains(&permission)
    }

    pub fn outranks(self, other: Role) -> bool {
        self > other
    }

    /// Roles may hand out strictly lower roles; super administrators may assign any role.
    pub fn can_assign(self, other: Role) -> bool {
        self == Role::SuperAdmin || self > other
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(raw);
        Role::ALL
            .into_iter()
            .find(|role| role.key() == normalized)
            .ok_or_else(|| UnknownRole(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// Actions gated by the authorization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    OrganizationsApprove,
    OrganizationManage,
    SettingsManage,
    MembersManage,
    MembersView,
    ResultsManage,
    ResultsView,
    AssessmentsTake,
    FeedPost,
    FeedModerate,
    ViewAs,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::OrganizationsApprove,
        Permission::OrganizationManage,
        Permission::SettingsManage,
        Permission::MembersManage,
        Permission::MembersView,
        Permission::ResultsManage,
        Permission::ResultsView,
        Permission::AssessmentsTake,
        Permission::FeedPost,
        Permission::FeedModerate,
        Permission::ViewAs,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Permission::OrganizationsApprove => "organizations_approve",
            Permission::OrganizationManage => "organization_manage",
            Permission::SettingsManage => "settings_manage",
            Permission::MembersManage => "members_manage",
            Permission::MembersView => "members_view",
            Permission::ResultsManage => "results_manage",
            Permission::ResultsView => "results_view",
            Permission::AssessmentsTake => "assessments_take",
            Permission::FeedPost => "feed_post",
            Permission::FeedModerate => "feed_moderate",
            Permission::ViewAs => "view_as",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(raw).to_ascii_lowercase();
        Permission::ALL
            .into_iter()
            .find(|permission| permission.key() == normalized)
            .ok_or_else(|| UnknownPermission(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

const ORG_OWNER_PERMISSIONS: &[Permission] = &[
    Permission::OrganizationManage,
    Permission::SettingsManage,
    Permission::MembersManage,
    Permission::MembersView,
    Permission::ResultsManage,
    Permission::ResultsView,
    Permission::AssessmentsTake,
    Permission::FeedPost,
    Permission::FeedModerate,
];

const ORG_ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::SettingsManage,
    Permission::MembersManage,
    Permission::MembersView,
    Permission::ResultsManage,
    Permission::ResultsView,
    Permission::AssessmentsTake,
    Permission::FeedPost,
    Permission::FeedModerate,
];

const ORG_LEADER_PERMISSIONS: &[Permission] = &[
    Permission::MembersView,
    Permission::ResultsView,
    Permission::AssessmentsTake,
    Permission::FeedPost,
    Permission::FeedModerate,
];

const ORG_VIEWER_PERMISSIONS: &[Permission] = &[
    Permission::MembersView,
    Permission::ResultsView,
    Permission::AssessmentsTake,
];

const PARTICIPANT_PERMISSIONS: &[Permission] = &[Permission::AssessmentsTake, Permission::FeedPost];

fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
