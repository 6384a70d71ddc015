use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::ExtractError;
use thiserror::Error;

use crate::database::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("additionalInformation is empty, that is classified as an error")]
    MissingAdditionalInformation,

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

impl AppError {
    /// Label used on the error counter.
    pub fn source_label(&self) -> &'static str {
        match self {
            AppError::MalformedPayload(_) => "malformed_payload",
            AppError::MissingAdditionalInformation => "missing_additional_information",
            AppError::StorageFailure(_) => "storage",
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::MalformedPayload(e) => AppError::MalformedPayload(e),
            ExtractError::MissingAdditionalInformation => AppError::MissingAdditionalInformation,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingAdditionalInformation => StatusCode::BAD_REQUEST,
            AppError::StorageFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
