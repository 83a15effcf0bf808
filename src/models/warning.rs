//! Modelo de advertencias de inspección
//!
//! Una fila por (tenant, reserva, tipo de advertencia).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de advertencia - mapea al ENUM inspection_warning_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "inspection_warning_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningType {
    KmOverLimit,
    FuelMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InspectionWarning {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub warning_type: WarningType,
    pub message: String,
    pub payload: Json<serde_json::Value>,
    pub acknowledged_by: Option<Uuid>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InspectionWarning {
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}

/// Advertencia calculada por el motor de reglas, aún sin persistir
#[derive(Debug, Clone, PartialEq)]
pub struct WarningDraft {
    pub warning_type: WarningType,
    pub message: String,
    pub payload: serde_json::Value,
}
