use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// A meal name that the label encoder never saw during training
    #[error("Unknown meal label: {0}")]
    UnknownLabel(String),

    #[error("Meal history is empty")]
    EmptyHistory,

    #[error("Model has not been trained")]
    ModelNotTrained,

    /// Every rejected field of a preference update; nothing was applied
    #[error("Invalid preference update: {}", .0.join("; "))]
    InvalidPreferences(Vec<String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UnknownLabel(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyHistory
            | AppError::InvalidPreferences(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotTrained => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Serialization(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_preferences_lists_every_field() {
        let err = AppError::InvalidPreferences(vec![
            "calorie_target: must be positive".to_string(),
            "unknown field `colour`".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid preference update: calorie_target: must be positive; unknown field `colour`"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::UnknownLabel("Pizza".to_string()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::EmptyHistory.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ModelNotTrained.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
