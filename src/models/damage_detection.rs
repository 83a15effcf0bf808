//! Modelo de detección de daños
//!
//! Una fila por (tenant, vehículo, reserva). Se reprocesa en sitio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la detección - mapea al ENUM damage_detection_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "damage_detection_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Verified,
    FalsePositive,
}

impl DetectionStatus {
    /// Anotado por un revisor humano: el algoritmo ya no vuelve a ejecutarse
    pub fn is_human_verified(&self) -> bool {
        matches!(self, DetectionStatus::Verified | DetectionStatus::FalsePositive)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Dent,
    Scratch,
    Other,
}

/// Zona dañada con caja normalizada a [0,1]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DamagedArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
    #[serde(rename = "type")]
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DamageDetection {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vehicle_id: Uuid,
    pub reservation_id: Uuid,
    pub checkin_photo_urls: Vec<String>,
    pub checkout_photo_urls: Vec<String>,
    pub damage_probability: Option<f64>,
    pub confidence_score: Option<f64>,
    pub damaged_areas: Json<Vec<DamagedArea>>,
    pub difference_image_url: Option<String>,
    pub status: DetectionStatus,
    pub error_message: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inicio (o reinicio) de un procesamiento
#[derive(Debug, Clone)]
pub struct DetectionRun {
    pub tenant_id: Uuid,
    pub vehicle_id: Uuid,
    pub reservation_id: Uuid,
    pub checkin_photo_urls: Vec<String>,
    pub checkout_photo_urls: Vec<String>,
}

/// Resultado persistible del motor
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub damage_probability: f64,
    pub confidence_score: f64,
    pub damaged_areas: Vec<DamagedArea>,
    pub difference_image_url: String,
}

#[derive(Debug, Clone)]
pub struct VerificationWrite {
    pub verified_by: Uuid,
    pub is_damage: bool,
    pub notes: Option<String>,
}
