//! Request-level errors and their JSON rendering.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::document::{ConversionError, RenderError};
use crate::email::MailError;
use crate::invoice::DecodeError;
use crate::store::StoreError;
use crate::ErrorResponse;

/// Every way a route can fail. The `Display` text is the headline sent to the
/// client; the underlying cause goes into `details`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid payload.")]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Validation(String),
    #[error("Failed to render invoice.")]
    Render {
        source: RenderError,
        path: Option<String>,
    },
    #[error("Failed to generate invoice PDF.")]
    Conversion(#[from] ConversionError),
    #[error("Failed to send {kind} email.")]
    Send {
        kind: &'static str,
        source: MailError,
    },
    #[error("Failed to load {what}.")]
    Query {
        what: &'static str,
        source: StoreError,
    },
    #[error("Too many orders ({0}). Please narrow the date range.")]
    LimitExceeded(usize),
    #[error("Failed to generate XLSX.")]
    Workbook(String),
    #[error("Unauthorized")]
    Unauthorized(String),
}

impl AppError {
    pub fn details(&self) -> Option<String> {
        match self {
            AppError::Decode(e) => Some(e.to_string()),
            AppError::Render { source, .. } => Some(source.to_string()),
            AppError::Conversion(e) => Some(e.to_string()),
            AppError::Send { source, .. } => Some(source.to_string()),
            AppError::Query { source, .. } => Some(source.to_string()),
            AppError::Workbook(message) | AppError::Unauthorized(message) => Some(message.clone()),
            AppError::Validation(_) | AppError::LimitExceeded(_) => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) | AppError::Validation(_) | AppError::LimitExceeded(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Render { .. }
            | AppError::Conversion(_)
            | AppError::Send { .. }
            | AppError::Query { .. }
            | AppError::Workbook(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let headline = self.to_string();
        let mut body = match self.details() {
            Some(details) => ErrorResponse::with_details(&headline, &details),
            None => ErrorResponse::new(&headline),
        };
        if let AppError::Render { path, .. } = self {
            body.path = path.clone();
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_error_has_no_details() {
        let (status, body) =
            body_json(AppError::Validation("Missing customer email.".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Missing customer email.");
        assert!(body.get("details").is_none());
        assert!(body.get("path").is_none());
    }

    #[actix_web::test]
    async fn test_render_error_carries_path() {
        let (status, body) = body_json(AppError::Render {
            source: RenderError::Execute("boom".to_string()),
            path: Some("/srv/views/invoice.preview.html".to_string()),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to render invoice.");
        assert_eq!(body["details"], "rendering failed: boom");
        assert_eq!(body["path"], "/srv/views/invoice.preview.html");
    }

    #[actix_web::test]
    async fn test_limit_exceeded_message() {
        let (status, body) = body_json(AppError::LimitExceeded(2001)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Too many orders (2001). Please narrow the date range."
        );
    }

    #[actix_web::test]
    async fn test_query_error_names_the_collection() {
        let (status, body) = body_json(AppError::Query {
            what: "frame items",
            source: StoreError::Decode("bad json".to_string()),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to load frame items.");
    }
}
