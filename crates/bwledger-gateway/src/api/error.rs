//! HTTP mapping for `LedgerError`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use bwledger_core::error::{ClientCode, LedgerError};

/// `LedgerError` carried out of a handler.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError(LedgerError::InvalidArgument(format!("invalid json body: {}", e.body_text())))
    }
}

pub fn status_of(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::InvalidArgument | ClientCode::CapacityExceeded => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Forbidden => StatusCode::FORBIDDEN,
        ClientCode::Conflict => StatusCode::CONFLICT,
        ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        if code == ClientCode::Internal {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status_of(code), body).into_response()
    }
}
