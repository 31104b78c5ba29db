use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CampusError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form-level validation message, shown to the user as-is.
    #[error("{0}")]
    Validation(String),

    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("Student with this roll number or email already exists")]
    DuplicateStudent,

    #[error("Teacher with this employee ID or email already exists")]
    DuplicateTeacher,

    #[error("Update failed: {0} already exists")]
    UpdateConflict(&'static str),

    #[error("Invalid credentials. Please check your {0} and password.")]
    InvalidCredentials(&'static str),

    #[error("Please log in first")]
    Unauthenticated,

    #[error("This session may not {0}")]
    Forbidden(&'static str),

    #[error("Student not found")]
    StudentNotFound,

    #[error("Teacher not found")]
    TeacherNotFound,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("Upstream request quota exhausted")]
    RateLimited,

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Upstream stream error: {0}")]
    UpstreamStream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for CampusError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let (status, code) = match &self {
            CampusError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            CampusError::Rejected(status, _) => {
                let code = match *status {
                    StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                    StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
                    _ => "BAD_REQUEST",
                };
                (*status, code)
            }
            CampusError::DuplicateStudent
            | CampusError::DuplicateTeacher
            | CampusError::UpdateConflict(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            CampusError::InvalidCredentials(_) => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            CampusError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            CampusError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CampusError::StudentNotFound
            | CampusError::TeacherNotFound
            | CampusError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CampusError::Json(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            CampusError::RactorError(_) | CampusError::Config(_) => {
                return internal_error();
            }
            CampusError::MissingApiKey | CampusError::RateLimited => {
                (StatusCode::SERVICE_UNAVAILABLE, "ASSISTANT_UNAVAILABLE")
            }
            CampusError::Reqwest(_)
            | CampusError::UrlParse(_)
            | CampusError::UpstreamStream(_) => {
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY")
            }
            CampusError::UpstreamStatus(code) => {
                let err_code = match *code {
                    StatusCode::TOO_MANY_REQUESTS => "RATE_LIMIT",
                    StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
                    StatusCode::FORBIDDEN => "FORBIDDEN",
                    StatusCode::NOT_FOUND => "NOT_FOUND",
                    _ => "UPSTREAM_ERROR",
                };
                (*code, err_code)
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

fn internal_error() -> axum::response::Response {
    let body = ApiErrorBody {
        code: "INTERNAL_ERROR".to_string(),
        message: "An internal server error occurred.".to_string(),
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse { error: body }),
    )
        .into_response()
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
