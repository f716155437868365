use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("account not found")]
    AccountNotFound,
    #[error("paste not found")]
    PasteNotFound {
        requested_id: String,
        total_pastes: usize,
    },
    #[error("paste content is required")]
    EmptyContent,
    #[error("invalid request body: {source}")]
    InvalidBody {
        #[from]
        source: JsonRejection,
    },
    #[error("the account was modified concurrently, try again")]
    Conflict,
    #[error("timed out waiting for the account store")]
    StoreTimeout,
    #[error("database error")]
    Database {
        #[from]
        source: sqlx::Error,
    },
    #[error("malformed account record")]
    Corrupt {
        #[from]
        source: serde_json::Error,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::AccountNotFound => StatusCode::NOT_FOUND,
            ApiError::PasteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::EmptyContent => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::StoreTimeout => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status_code.is_server_error() {
            error!("request failed: {self}");
        }

        let mut body = json!({
            "success": false,
            "error": format!("{self}"),
        });
        if let ApiError::PasteNotFound {
            requested_id,
            total_pastes,
        } = &self
        {
            body["details"] = json!({
                "requestedId": requested_id,
                "totalPastes": total_pastes,
            });
        }

        (status_code, Json(body)).into_response()
    }
}
