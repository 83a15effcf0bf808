use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{InspectionPhoto, InspectionRecord, PhotoSlot};

// Foto enviada por el cliente para un slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhotoInput {
    #[validate(range(min = 1, max = 8))]
    pub slot_index: i16,
    #[validate(length(min = 1, max = 2048))]
    pub media_url: String,
}

impl PhotoInput {
    pub fn new(slot_index: i16, media_url: impl Into<String>) -> Self {
        Self {
            slot_index,
            media_url: media_url.into(),
        }
    }
}

impl From<&PhotoInput> for PhotoSlot {
    fn from(photo: &PhotoInput) -> Self {
        Self {
            slot_index: photo.slot_index,
            media_url: photo.media_url.trim().to_string(),
        }
    }
}

// Request de borrador: todos los campos opcionales
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SaveDraftRequest {
    pub odometer_km: Option<i64>,
    #[validate(length(max = 32))]
    pub fuel_level: Option<String>,
    #[serde(default)]
    #[validate]
    pub photos: Vec<PhotoInput>,
}

// Request de cierre de inspección
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteInspectionRequest {
    pub odometer_km: i64,
    #[validate(length(max = 32))]
    pub fuel_level: String,
    #[validate]
    pub photos: Vec<PhotoInput>,
    #[serde(default)]
    pub acknowledged_warnings: Vec<Uuid>,
}

// Inspección con sus fotos ordenadas por slot
#[derive(Debug, Clone, Serialize)]
pub struct InspectionResponse {
    #[serde(flatten)]
    pub record: InspectionRecord,
    pub photos: Vec<InspectionPhoto>,
}

// Fotos de recogida y devolución para comparar daños
#[derive(Debug, Clone, Serialize)]
pub struct DamageCompareResponse {
    pub pickup_photos: Vec<InspectionPhoto>,
    pub return_photos: Vec<InspectionPhoto>,
}
