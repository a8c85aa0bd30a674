use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::errors::GameError;

impl GameError {
    pub fn status(&self) -> StatusCode {
        match self {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GameError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GameError::Conflict(_)
            | GameError::AlreadySettled
            | GameError::AlreadyReported
            | GameError::Validation(_)
            | GameError::Full => StatusCode::BAD_REQUEST,
            GameError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            GameError::Storage(e) => {
                log::error!("Storage error: {:?}", e);
                "Internal server error.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        GameError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for GameError {
    fn from(rejection: PathRejection) -> Self {
        GameError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GameError {
    fn from(rejection: QueryRejection) -> Self {
        GameError::Validation(rejection.body_text())
    }
}
