use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::entities::ValidationError;
use crate::models::Resource;
use crate::repo::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: &'static str,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ForumError {
    #[error("{}", .0.client_message())]
    Validation(#[from] ValidationError),
    /// Malformed request not tied to an entity, e.g. a body that is not JSON.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("anda tidak berhak mengakses {0} tersebut")]
    Forbidden(Resource),
    #[error("{0} tidak ditemukan di database")]
    NotFound(Resource),
    #[error("terjadi kegagalan pada server kami")]
    Internal(String),
}

impl From<RepoError> for ForumError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(r) => ForumError::NotFound(r),
            RepoError::Forbidden(r) => ForumError::Forbidden(r),
            RepoError::Invalid(v) => ForumError::Internal(format!("stored row failed validation: {v}")),
            RepoError::Internal(msg) => ForumError::Internal(msg),
        }
    }
}

impl ResponseError for ForumError {
    fn status_code(&self) -> StatusCode {
        match self {
            ForumError::Validation(_) | ForumError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ForumError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ForumError::Forbidden(_) => StatusCode::FORBIDDEN,
            ForumError::NotFound(_) => StatusCode::NOT_FOUND,
            ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = if let ForumError::Internal(detail) = self {
            tracing::error!(%detail, "request failed");
            "error"
        } else {
            tracing::debug!(status = %self.status_code(), message = %self, "request rejected");
            "fail"
        };
        HttpResponse::build(self.status_code()).json(ApiErrorBody { status, message: self.to_string() })
    }
}
