//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InspectionWarning, WarningType};

/// Advertencia pendiente tal como se devuelve al cliente
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PendingWarning {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub warning_type: WarningType,
    pub message: String,
    pub payload: serde_json::Value,
}

impl From<&InspectionWarning> for PendingWarning {
    fn from(warning: &InspectionWarning) -> Self {
        Self {
            id: warning.id,
            warning_type: warning.warning_type,
            message: warning.message.clone(),
            payload: warning.payload.0.clone(),
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{} warning(s) must be acknowledged", .0.len())]
    WarningsPending(Vec<PendingWarning>),

    #[error("Damage detection {detection_id} failed: {message}")]
    Processing { detection_id: Uuid, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    /// Código estable usado por los clientes
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::WarningsPending(_) => "WARNINGS_PENDING",
            AppError::Processing { .. } => "PROCESSING_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = Some(self.code().to_string());
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: None,
                        code,
                    },
                )
            }

            AppError::Validation(msg) => {
                tracing::debug!("Validation error: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: msg,
                        details: None,
                        code,
                    },
                )
            }

            AppError::InvalidInput(e) => {
                tracing::debug!("Invalid input: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code,
                    },
                )
            }

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::WarningsPending(warnings) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Warnings Pending".to_string(),
                    message: "Acknowledge the pending warnings before completing the return"
                        .to_string(),
                    details: Some(json!({ "warnings": warnings })),
                    code,
                },
            ),

            AppError::Processing { detection_id, message } => {
                tracing::warn!("⚠️ Detection {} failed: {}", detection_id, message);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Processing Failed".to_string(),
                        message,
                        details: Some(json!({ "detection_id": detection_id })),
                        code,
                    },
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code,
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(validation_error("x").code(), "VALIDATION_ERROR");
        assert_eq!(AppError::WarningsPending(vec![]).code(), "WARNINGS_PENDING");
        assert_eq!(
            not_found_error("Reservation", &Uuid::nil()).to_string(),
            "Not found: Reservation with id '00000000-0000-0000-0000-000000000000' not found"
        );
    }

    #[test]
    fn test_warnings_pending_status() {
        let response = AppError::WarningsPending(vec![]).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
