use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::access::{OrganizationId, UserId};

/// Identifier wrapper for questionnaire attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponseId(pub String);

/// Identifier wrapper for scored results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Questionnaire version the response was taken against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spiritual-gift categories in declaration order.
///
/// Declaration order is the ranking tiebreak and the key order of serialized totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftCategory {
    LeadershipOrg,
    Teaching,
    WisdomInsight,
    PropheticDiscernment,
    Exhortation,
    Shepherding,
    Faith,
    Evangelism,
    Apostleship,
    ServiceHospitality,
    Mercy,
    Giving,
}

impl GiftCategory {
    pub const ALL: [GiftCategory; 12] = [
        GiftCategory::LeadershipOrg,
        GiftCategory::Teaching,
        GiftCategory::WisdomInsight,
        GiftCategory::PropheticDiscernment,
        GiftCategory::Exhortation,
        GiftCategory::Shepherding,
        GiftCategory::Faith,
        GiftCategory::Evangelism,
        GiftCategory::Apostleship,
        GiftCategory::ServiceHospitality,
        GiftCategory::Mercy,
        GiftCategory::Giving,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            GiftCategory::LeadershipOrg => "LEADERSHIP_ORG",
            GiftCategory::Teaching => "TEACHING",
            GiftCategory::WisdomInsight => "WISDOM_INSIGHT",
            GiftCategory::PropheticDiscernment => "PROPHETIC_DISCERNMENT",
            GiftCategory::Exhortation => "EXHORTATION",
            GiftCategory::Shepherding => "SHEPHERDING",
            GiftCategory::Faith => "FAITH",
            GiftCategory::Evangelism => "EVANGELISM",
            GiftCategory::Apostleship => "APOSTLESHIP",
            GiftCategory::ServiceHospitality => "SERVICE_HOSPITALITY",
            GiftCategory::Mercy => "MERCY",
            GiftCategory::Giving => "GIVING",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            GiftCategory::LeadershipOrg => "Leadership / Organization",
            GiftCategory::Teaching => "Teaching",
            GiftCategory::WisdomInsight => "Wisdom / Insight",
            GiftCategory::PropheticDiscernment => "Prophetic Discernment",
            GiftCategory::Exhortation => "Exhortation",
            GiftCategory::Shepherding => "Shepherding",
            GiftCategory::Faith => "Faith",
            GiftCategory::Evangelism => "Evangelism",
            GiftCategory::Apostleship => "Apostleship",
            GiftCategory::ServiceHospitality => "Service / Hospitality",
            GiftCategory::Mercy => "Mercy",
            GiftCategory::Giving => "Giving",
        }
    }

    /// Case-insensitive lookup; `-` and spaces are accepted in place of `_`.
    pub fn from_key(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|ch| match ch {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        GiftCategory::ALL
            .into_iter()
            .find(|category| category.key() == normalized)
    }
}

impl fmt::Display for GiftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One Likert answer as captured by the questionnaire.
///
/// `gift_key` stays raw text so the scorer can report keys outside the category set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(alias = "questionId")]
    pub question_id: QuestionId,
    #[serde(alias = "giftKey")]
    pub gift_key: String,
    pub value: i64,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, gift_key: impl Into<String>, value: i64) -> Self {
        Self {
            question_id: QuestionId(question_id.into()),
            gift_key: gift_key.into(),
            value,
        }
    }
}

/// A user's attempt at the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub id: ResponseId,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub version_id: VersionId,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl AssessmentResponse {
    pub fn is_open(&self) -> bool {
        self.submitted_at.is_none()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// Lifecycle of a response and its derived result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Open,
    Submitted,
    Scored,
    Expired,
}

impl ResponseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ResponseStatus::Open => "open",
            ResponseStatus::Submitted => "submitted",
            ResponseStatus::Scored => "scored",
            ResponseStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
