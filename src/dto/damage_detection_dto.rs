use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Request para procesar una detección de daños
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessDetectionRequest {
    pub vehicle_id: Uuid,
    pub reservation_id: Uuid,
    #[serde(default)]
    pub checkin_photo_urls: Vec<String>,
    #[serde(default)]
    pub checkout_photo_urls: Vec<String>,
}

// Request de verificación humana
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyDetectionRequest {
    pub is_damage: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
