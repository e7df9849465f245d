use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tillroll_ocr::{PipelineError, PreprocessError};
use tillroll_storage::VocabularyError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::Ocr(_)) => StatusCode::BAD_GATEWAY,
            // The upload was over the size limit and could not be decoded.
            AppError::Pipeline(PipelineError::Preprocess(PreprocessError::Load(_))) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Pipeline(_) | AppError::Vocabulary(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
