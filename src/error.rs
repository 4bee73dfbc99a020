use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::{ErrorBody, FieldError, ValidationErrorBody};

/// Failures of the model artifact or of a single inference call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model from {}: {}", .path.display(), .message)]
    Load { path: PathBuf, message: String },

    #[error("{0}")]
    Inference(String),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Error predicting recipe traffic: {0}")]
    Prediction(String),
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::Prediction(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        match self {
            ApiError::Validation(errors) => res.json(ValidationErrorBody { detail: errors }),
            ApiError::Prediction(_) => res.json(ErrorBody {
                detail: self.to_string(),
            }),
        }
    }
}
