use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::api::ErrorResponse;
use crate::catalog_repository::CatalogRepositoryError;
use crate::catalog_service::CatalogServiceError;

/// Error returned by the http handlers, rendered as a JSON [`ErrorResponse`]
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("method not supported")]
    MethodNotAllowed,

    #[error("internal storage error")]
    Storage,
}

impl From<CatalogServiceError> for ApiError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::Validation(errors) => ApiError::Validation(errors),
            CatalogServiceError::Repository(err) if err.is_not_found() => {
                ApiError::NotFound(err.to_string())
            }
            CatalogServiceError::Repository(err @ CatalogRepositoryError::AuthorHasBooks(_)) => {
                ApiError::Conflict(err.to_string())
            }
            CatalogServiceError::Repository(err) => {
                tracing::error!("Storage failure {}", err);
                ApiError::Storage
            }
        }
    }
}

impl From<CatalogRepositoryError> for ApiError {
    fn from(err: CatalogRepositoryError) -> Self {
        CatalogServiceError::from(err).into()
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let errors = match self {
            ApiError::Validation(errors) => errors.clone(),
            _ => vec![],
        };
        HttpResponse::build(status).json(ErrorResponse {
            code: status.as_u16(),
            message: self.to_string(),
            errors,
        })
    }
}
