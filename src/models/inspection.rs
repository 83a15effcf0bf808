//! Modelo de inspección (recogida / devolución)
//!
//! Mapea las tablas `inspection_records` e `inspection_photos`.
//! Un registro por (tenant, reserva, tipo) y una foto por slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Número fijo de slots fotográficos por inspección
pub const PHOTO_SLOT_COUNT: i16 = 8;

/// Tipo de inspección - mapea al ENUM inspection_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "inspection_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InspectionType {
    Pickup,
    Return,
}

impl InspectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionType::Pickup => "pickup",
            InspectionType::Return => "return",
        }
    }
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado de la inspección - mapea al ENUM inspection_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "inspection_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InspectionStatus {
    Draft,
    Completed,
}

/// Registro de recogida o devolución
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InspectionRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub inspection_type: InspectionType,
    pub odometer_km: Option<i64>,
    pub fuel_level: Option<String>,
    pub status: InspectionStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InspectionRecord {
    /// Nuevo borrador vacío
    pub fn new_draft(
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            reservation_id,
            inspection_type,
            odometer_km: None,
            fuel_level: None,
            status: InspectionStatus::Draft,
            completed_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == InspectionStatus::Completed
    }
}

/// Foto de un slot de inspección
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InspectionPhoto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub inspection_type: InspectionType,
    pub slot_index: i16,
    pub media_url: String,
    pub created_at: DateTime<Utc>,
}

/// Foto entrante (slot + URL), usada tanto en borradores como al completar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSlot {
    pub slot_index: i16,
    pub media_url: String,
}

/// Escritura de borrador ya validada
#[derive(Debug, Clone)]
pub struct DraftWrite {
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub inspection_type: InspectionType,
    pub user_id: Uuid,
    pub odometer_km: Option<i64>,
    pub fuel_level: Option<String>,
    pub photos: Vec<PhotoSlot>,
}

/// Escritura atómica de cierre de inspección
#[derive(Debug, Clone)]
pub struct CompletionWrite {
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub inspection_type: InspectionType,
    pub user_id: Uuid,
    pub odometer_km: i64,
    pub fuel_level: String,
    pub photos: Vec<PhotoSlot>,
    pub acknowledged_warning_ids: Vec<Uuid>,
    pub completed_at: DateTime<Utc>,
}
