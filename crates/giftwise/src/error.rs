use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::access::{AccessError, PrincipalHeaderError};
use crate::workflows::assessment::{AnswerImportError, AssessmentError, RepositoryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(AnswerImportError),
    Principal(PrincipalHeaderError),
    Access(AccessError),
    Assessment(AssessmentError),
}

impl AppError {
    /// Stable machine-readable code included in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Principal(PrincipalHeaderError::Missing(_)) => "unauthenticated",
            AppError::Principal(PrincipalHeaderError::Invalid { .. }) => "invalid_principal",
            AppError::Access(AccessError::Permission { .. }) => "insufficient_role",
            AppError::Access(AccessError::OrganizationMismatch { .. }) => "organization_mismatch",
            AppError::Access(AccessError::EmptyViewContext) | AppError::Import(_) => "validation",
            AppError::Assessment(AssessmentError::InvalidState { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::Conflict)) => {
                "invalid_state"
            }
            AppError::Assessment(AssessmentError::NotFound { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::NotFound)) => {
                "not_found"
            }
            AppError::Access(AccessError::Store(_))
            | AppError::Assessment(AssessmentError::ExpirationOutOfRange { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::Unavailable(_)))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Principal(PrincipalHeaderError::Missing(_)) => StatusCode::UNAUTHORIZED,
            AppError::Principal(PrincipalHeaderError::Invalid { .. }) => StatusCode::BAD_REQUEST,
            AppError::Access(AccessError::Permission { .. })
            | AppError::Access(AccessError::OrganizationMismatch { .. }) => StatusCode::FORBIDDEN,
            AppError::Access(AccessError::EmptyViewContext) | AppError::Import(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Assessment(AssessmentError::InvalidState { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::Conflict)) => {
                StatusCode::CONFLICT
            }
            AppError::Assessment(AssessmentError::NotFound { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Access(AccessError::Store(_))
            | AppError::Assessment(AssessmentError::ExpirationOutOfRange { .. })
            | AppError::Assessment(AssessmentError::Repository(RepositoryError::Unavailable(_)))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "answer import error: {}", err),
            AppError::Principal(err) => write!(f, "principal error: {}", err),
            AppError::Access(err) => write!(f, "access error: {}", err),
            AppError::Assessment(err) => write!(f, "assessment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Principal(err) => Some(err),
            AppError::Access(err) => Some(err),
            AppError::Assessment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AnswerImportError> for AppError {
    fn from(value: AnswerImportError) -> Self {
        Self::Import(value)
    }
}

impl From<PrincipalHeaderError> for AppError {
    fn from(value: PrincipalHeaderError) -> Self {
        Self::Principal(value)
    }
}

impl From<AccessError> for AppError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<AssessmentError> for AppError {
    fn from(value: AssessmentError) -> Self {
        Self::Assessment(value)
    }
}
