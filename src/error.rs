use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::imaging::ImageError;
use crate::model::ModelError;
use crate::units::WeightError;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("'{0}' must be provided")]
    MissingField(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("Required data files not found")]
    DataUnavailable,
    #[error(transparent)]
    Inference(#[from] ModelError),
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::BadRequest(_)
            | AppError::Image(ImageError::TooLarge { .. }) => StatusCode::BAD_REQUEST,
            AppError::DataUnavailable | AppError::Inference(_) | AppError::Image(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Inference(_) => "Model inference failed".to_string(),
            AppError::Image(ImageError::Fetch(_)) => "Could not fetch the image".to_string(),
            AppError::Image(ImageError::Decode(_)) => "Could not decode the image".to_string(),
            AppError::Image(ImageError::TooLarge { limit }) => {
                format!("Image exceeds the {} byte size limit", limit)
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<WeightError> for AppError {
    fn from(err: WeightError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_requests() {
        assert_eq!(AppError::MissingField("bmi").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingField("bmi").to_string(), "'bmi' must be provided");
        assert_eq!(
            AppError::from(WeightError::InvalidFormat("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_errors_hide_internals() {
        let err = AppError::from(ModelError::Backend("CUDA out of memory".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Model inference failed");
        assert_eq!(
            AppError::DataUnavailable.public_message(),
            "Required data files not found"
        );
    }

    #[test]
    fn inference_errors_keep_a_single_prefix() {
        let err = AppError::from(ModelError::Backend("session closed".into()));
        assert_eq!(err.to_string(), "inference failed: session closed");
    }

    #[test]
    fn oversized_images_are_client_errors() {
        let err = AppError::from(ImageError::TooLarge { limit: 1024 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Image exceeds the 1024 byte size limit");
    }
}
