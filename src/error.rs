use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Missing parameter '{0}'")]
    MissingParam(String),

    #[error("No catalog entry for {0}")]
    UnknownScenario(String),

    #[error("No benchmark result for key '{0}'")]
    ResultNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MeterResult<T> = Result<T, MeterError>;

impl IntoResponse for MeterError {
    fn into_response(self) -> Response {
        let status = match &self {
            MeterError::Parse(_)
            | MeterError::MissingParam(_)
            | MeterError::Json(_)
            | MeterError::UnknownScenario(_) => StatusCode::BAD_REQUEST,
            MeterError::ResultNotFound(_) => StatusCode::NOT_FOUND,
            MeterError::Query(_) | MeterError::Operation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MeterError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            MeterError::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
