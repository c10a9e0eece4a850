use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::routes::common::error_response;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid credentials")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("a category cannot be placed under itself or one of its subcategories")]
    CategoryCycle,

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    TooLarge(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("file storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self{
        Self::Validation(message.into())
    }

    fn status(&self) -> StatusCode{
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::CategoryCycle | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Store(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> String{
        match self {
            AppError::Unauthorized => "auth.invalid".to_string(),
            AppError::Forbidden => "auth.forbidden".to_string(),
            AppError::Validation(_) => "validation.failed".to_string(),
            AppError::NotFound(entity) => format!("{entity}.not_found"),
            AppError::CategoryCycle => "category.cycle".to_string(),
            AppError::Upload(_) => "upload.failed".to_string(),
            AppError::TooLarge(_) => "upload.too_large".to_string(),
            AppError::Store(_) | AppError::Storage(_) => "server.error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response{
        let message = match &self {
            AppError::Store(e) => {
                error!("Store failure: {e}");
                "internal server error".to_string()
            }
            AppError::Storage(e) => {
                error!("File storage failure: {e}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        error_response(self.status(), &self.code(), &message).into_response()
    }
}
