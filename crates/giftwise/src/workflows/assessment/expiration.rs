use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::AssessmentConfig;

const SECONDS_PER_DAY: i64 = 86_400;

/// Result retention window and the warning thresholds derived from it.
///
/// Expiration is computed on read; nothing sweeps or mutates stored results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    validity: Duration,
    near_threshold: Duration,
    very_near_threshold: Duration,
}

impl ExpirationPolicy {
    pub fn new(validity_days: u32, near_days: u32, very_near_days: u32) -> Self {
        Self {
            validity: Duration::days(i64::from(validity_days)),
            near_threshold: Duration::days(i64::from(near_days)),
            very_near_threshold: Duration::days(i64::from(very_near_days)),
        }
    }

    pub fn from_config(config: &AssessmentConfig) -> Self {
        Self::new(
            config.result_validity_days,
            config.near_expiration_days,
            config.very_near_expiration_days,
        )
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// `None` when the window runs past the representable date range.
    pub fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        created_at.checked_add_signed(self.validity)
    }

    pub fn status(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpirationStatus {
        let remaining = expires_at - now;
        let is_expired = now > expires_at;

        let days_until_expiration = if is_expired {
            0
        } else {
            // Partial days count as a full day remaining.
            (remaining.num_seconds() + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
        };

        ExpirationStatus {
            is_expired,
            is_near_expiration: !is_expired && remaining <= self.near_threshold,
            is_very_near_expiration: !is_expired && remaining <= self.very_near_threshold,
            days_until_expiration,
        }
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::from_config(&AssessmentConfig::default())
    }
}

/// Warning flags for a result at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpirationStatus {
    pub is_expired: bool,
    pub is_near_expiration: bool,
    pub is_very_near_expiration: bool,
    pub days_until_expiration: i64,
}

impl ExpirationStatus {
    /// Expired results stay queryable but may not be shared or shown to collaborators.
    pub fn is_shareable(&self) -> bool {
        !self.is_expired
    }
}
