use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use seatkeeper_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            other => {
                tracing::warn!(status = status.as_u16(), "request rejected: {}", other);
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            CoreError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CoreError::InsufficientSeats { .. } | CoreError::DuplicateGuest(_) => {
                AppError::ConflictError(err.to_string())
            }
            CoreError::Storage(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_core_errors_map_to_distinct_statuses() {
        let cases = [
            (CoreError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("table".into()), StatusCode::NOT_FOUND),
            (
                CoreError::InsufficientSeats { table_id: Uuid::new_v4(), requested: 2, available: 1 },
                StatusCode::CONFLICT,
            ),
            (CoreError::DuplicateGuest("Ada".into()), StatusCode::CONFLICT),
            (CoreError::Storage("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let response = AppError::from(CoreError::Storage("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
