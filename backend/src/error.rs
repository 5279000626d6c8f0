use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shared::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::service::ServiceError;
use crate::validation::FieldError;

pub const TASK_NOT_FOUND: &str = "Task not found";
pub const NO_UPDATE_DATA: &str = "No update data provided";

/// Every failure a handler can answer with. HTTP shaping happens here and
/// nowhere below the handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}: {detail}")]
    Unexpected {
        message: &'static str,
        detail: String,
    },
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    errors: Vec<FieldError>,
}

impl ApiError {
    pub fn unexpected(message: &'static str, cause: impl Display) -> Self {
        Self::Unexpected {
            message,
            detail: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::TaskNotFound(_) => Self::NotFound(TASK_NOT_FOUND),
            ServiceError::Unexpected(cause) => Self::unexpected("Internal server error", cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (status, Json(ValidationBody { errors })).into_response(),
            Self::BadRequest(message) | Self::NotFound(message) => {
                let body = ErrorBody {
                    message: message.to_string(),
                    error: None,
                };
                (status, Json(body)).into_response()
            }
            Self::Unexpected { message, detail } => {
                error!(%detail, "{message}");
                let body = ErrorBody {
                    message: message.to_string(),
                    error: Some(detail),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
