//! Servicio de detección de daños
//!
//! Orquesta una ejecución: comprobación de pertenencia, fotos (con
//! respaldo en las fotos de inspección), motor de imágenes en un hilo
//! bloqueante, imagen de diferencias y persistencia del resultado.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::dto::{ProcessDetectionRequest, VerifyDetectionRequest};
use crate::models::{
    DamageDetection, DetectionOutcome, DetectionRun, InspectionPhoto, VerificationWrite,
};
use crate::repositories::{DetectionStore, FleetDirectory};
use crate::services::damage_detection::DamageDetectionEngine;
use crate::services::file_store::FileStore;
use crate::services::inspection_workflow::InspectionWorkflow;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

const OVERLAY_DIR: &str = "damage-detections";

pub struct DamageDetectionService {
    store: Arc<dyn DetectionStore>,
    fleet: Arc<dyn FleetDirectory>,
    workflow: Arc<InspectionWorkflow>,
    files: Arc<dyn FileStore>,
    engine: DamageDetectionEngine,
}

fn urls(photos: &[InspectionPhoto]) -> Vec<String> {
    photos.iter().map(|photo| photo.media_url.clone()).collect()
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

impl DamageDetectionService {
    pub fn new(
        store: Arc<dyn DetectionStore>,
        fleet: Arc<dyn FleetDirectory>,
        workflow: Arc<InspectionWorkflow>,
        files: Arc<dyn FileStore>,
        engine: DamageDetectionEngine,
    ) -> Self {
        Self { store, fleet, workflow, files, engine }
    }

    async fn ensure_ownership(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<()> {
        if !self.fleet.vehicle_belongs_to(tenant_id, vehicle_id).await? {
            return Err(not_found_error("Vehicle", &vehicle_id));
        }

        let reservation = self.fleet.find_reservation(reservation_id).await?;
        match reservation {
            Some(r) if r.tenant_id == tenant_id && r.vehicle_id == vehicle_id => Ok(()),
            _ => Err(not_found_error("Reservation", &reservation_id)),
        }
    }

    /// Completa las listas vacías con las fotos de recogida/devolución
    async fn resolve_photos(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        checkin: Vec<String>,
        checkout: Vec<String>,
    ) -> AppResult<(Vec<String>, Vec<String>)> {
        if !checkin.is_empty() && !checkout.is_empty() {
            return Ok((checkin, checkout));
        }

        let compare = self.workflow.damage_compare(tenant_id, reservation_id).await;
        let (pickup, returned) = match compare {
            Ok(compare) => (urls(&compare.pickup_photos), urls(&compare.return_photos)),
            Err(AppError::NotFound(_)) => (Vec::new(), Vec::new()),
            Err(e) => return Err(e),
        };

        let checkin = if checkin.is_empty() { pickup } else { checkin };
        let checkout = if checkout.is_empty() { returned } else { checkout };
        Ok((checkin, checkout))
    }

    /// Ejecuta (o re-ejecuta) la detección para (vehículo, reserva)
    pub async fn process(
        &self,
        tenant_id: Uuid,
        request: ProcessDetectionRequest,
    ) -> AppResult<DamageDetection> {
        let ProcessDetectionRequest {
            vehicle_id,
            reservation_id,
            checkin_photo_urls,
            checkout_photo_urls,
        } = request;

        self.ensure_ownership(tenant_id, vehicle_id, reservation_id).await?;

        let (checkin_photo_urls, checkout_photo_urls) = self
            .resolve_photos(
                tenant_id,
                reservation_id,
                clean(checkin_photo_urls),
                clean(checkout_photo_urls),
            )
            .await?;
        if checkin_photo_urls.is_empty() || checkout_photo_urls.is_empty() {
            return Err(validation_error("Check-in and check-out photos are required"));
        }

        let detection = self
            .store
            .start_run(&DetectionRun {
                tenant_id,
                vehicle_id,
                reservation_id,
                checkin_photo_urls: checkin_photo_urls.clone(),
                checkout_photo_urls: checkout_photo_urls.clone(),
            })
            .await?
            .ok_or_else(|| AppError::Conflict("Detection has already been verified".to_string()))?;

        info!("🔍 Procesando detección {} (vehículo {})", detection.id, vehicle_id);

        match self.run(detection.id, &checkin_photo_urls[0], &checkout_photo_urls[0]).await {
            Ok(outcome) => {
                let completed = self.store.mark_completed(detection.id, &outcome).await?;
                info!(
                    "✅ Detección {} completada: probabilidad {:.2}, confianza {:.2}, {} zona(s)",
                    completed.id,
                    outcome.damage_probability,
                    outcome.confidence_score,
                    outcome.damaged_areas.len()
                );
                Ok(completed)
            }
            Err(message) => {
                error!("❌ Detección {} fallida: {}", detection.id, message);
                self.store.mark_failed(detection.id, &message).await?;
                Err(AppError::Processing { detection_id: detection.id, message })
            }
        }
    }

    /// Solo la primera foto de cada conjunto entra en la comparación
    async fn run(
        &self,
        detection_id: Uuid,
        checkin_url: &str,
        checkout_url: &str,
    ) -> Result<DetectionOutcome, String> {
        let checkin = self
            .files
            .read(checkin_url)
            .await
            .map_err(|e| format!("Unable to read check-in photo: {}", e))?;
        let checkout = self
            .files
            .read(checkout_url)
            .await
            .map_err(|e| format!("Unable to read check-out photo: {}", e))?;

        let engine = self.engine.clone();
        let report = tokio::task::spawn_blocking(move || engine.analyze_bytes(&checkin, &checkout))
            .await
            .map_err(|e| format!("Image analysis task aborted: {}", e))?
            .map_err(|e| e.to_string())?;

        let key = format!("{}/{}-{}.png", OVERLAY_DIR, detection_id, Utc::now().timestamp_millis());
        let difference_image_url = self
            .files
            .write(&key, report.difference_png)
            .await
            .map_err(|e| format!("Unable to store difference image: {}", e))?;

        Ok(DetectionOutcome {
            damage_probability: report.damage_probability,
            confidence_score: report.confidence_score,
            damaged_areas: report.damaged_areas,
            difference_image_url,
        })
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> AppResult<DamageDetection> {
        self.store
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| not_found_error("Damage detection", &id))
    }

    /// Anotación humana final; nunca vuelve a ejecutar el motor
    pub async fn verify(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        request: VerifyDetectionRequest,
    ) -> AppResult<DamageDetection> {
        let current = self.get(tenant_id, id).await?;

        let notes = request
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        let verified = self
            .store
            .verify(
                tenant_id,
                id,
                &VerificationWrite {
                    verified_by: user_id,
                    is_damage: request.is_damage,
                    notes,
                },
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Only completed detections can be verified (current status: {:?})",
                    current.status
                ))
            })?;

        info!("👤 Detección {} verificada como {:?}", id, verified.status);
        Ok(verified)
    }

    pub async fn list_for_vehicle(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Vec<DamageDetection>> {
        if !self.fleet.vehicle_belongs_to(tenant_id, vehicle_id).await? {
            return Err(not_found_error("Vehicle", &vehicle_id));
        }
        self.store.list_for_vehicle(tenant_id, vehicle_id).await
    }
}
