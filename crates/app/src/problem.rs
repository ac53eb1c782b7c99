use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use workright_core::{org::OrgTreeError, ValidationError};
use workright_storage::StorageError;

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
}

pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// Failure of a request handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The named record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    OrgTree(#[from] OrgTreeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ApiError> for ProblemResponse {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(_) => {
                ProblemResponse::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
            }
            ApiError::Validation(inner) => {
                ProblemResponse::new(StatusCode::BAD_REQUEST, "validation_error", inner.to_string())
            }
            ApiError::OrgTree(OrgTreeError::UnknownEmployee(_)) => {
                ProblemResponse::new(StatusCode::NOT_FOUND, "not_found", "Employee not found")
            }
            ApiError::OrgTree(inner @ OrgTreeError::Cycle(_)) => {
                error!(stage = "org", error = %inner, "reporting hierarchy is corrupt");
                ProblemResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "org_cycle",
                    "reporting hierarchy contains a cycle",
                )
            }
            ApiError::Storage(inner) => {
                error!(stage = "storage", error = %inner, "storage operation failed");
                ProblemResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "internal storage error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ProblemResponse::from(self).into_response()
    }
}
