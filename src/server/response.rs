//! Mapping of `BrainError` onto HTTP responses

use crate::error::BrainError;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Error payload returned to the UI; never carries source chains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: u16,
}

impl From<&BrainError> for ErrorBody {
    fn from(err: &BrainError) -> Self {
        Self {
            message: err.user_message(),
            code: err.code(),
        }
    }
}

impl IntoResponse for BrainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self.developer_message());
        } else {
            warn!("{}", self);
        }
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
