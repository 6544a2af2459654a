use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::Temperature;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("NLU provider error: {0}")]
    Nlu(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Nlu(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// A drink whose requested temperature contradicts the temperature it is always served at.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureViolation {
    pub drink: String,
    pub fixed: Temperature,
}

impl TemperatureViolation {
    fn message(&self) -> String {
        format!(
            "{}는(은) 온도가 {} 고정된 음료입니다! 다시 주문해 주세요.",
            self.drink,
            self.fixed.with_particle()
        )
    }
}

fn join_violations(violations: &[TemperatureViolation]) -> String {
    violations
        .iter()
        .map(TemperatureViolation::message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failures of one order operation. `Display` is the message read back to the customer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("정확한 음료의 종류를 말씀하여주세요.")]
    MissingDrink,

    #[error("{}", join_violations(.0))]
    FixedTemperature(Vec<TemperatureViolation>),

    #[error("{drink}은(는) 주문에 없습니다.")]
    NotInCart { drink: String },

    #[error("{drink}의 수량이 충분하지 않습니다.")]
    InsufficientQuantity { drink: String },

    #[error("처리 중 오류가 발생했습니다. 다시 시도해 주세요.")]
    Unhandled(String),
}

impl OrderError {
    /// One message per offending line for temperature violations, otherwise the single message.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            OrderError::FixedTemperature(violations) => {
                violations.iter().map(TemperatureViolation::message).collect()
            }
            other => vec![other.to_string()],
        }
    }
}
