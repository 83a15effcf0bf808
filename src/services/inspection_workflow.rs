//! Flujo de inspección de recogida y devolución
//!
//! Borrador → Completado. El cierre valida fotos y lecturas antes de
//! escribir nada, calcula las advertencias de la devolución, bloquea si
//! alguna queda sin acuse y finalmente delega en el store una única
//! transacción (registro + fotos + acuses).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dto::{
    CompleteInspectionRequest, DamageCompareResponse, InspectionResponse, SaveDraftRequest,
};
use crate::models::{
    CompletionWrite, DraftWrite, InspectionType, InspectionWarning, Reservation, ReservationKind,
};
use crate::repositories::{FleetDirectory, InspectionStore};
use crate::services::completion_events::{EventPublisher, InspectionEvent};
use crate::services::{photo_slots, warning_engine};
use crate::utils::errors::{validation_error, AppError, AppResult, PendingWarning};

pub struct InspectionWorkflow {
    store: Arc<dyn InspectionStore>,
    fleet: Arc<dyn FleetDirectory>,
    events: EventPublisher,
}

impl InspectionWorkflow {
    pub fn new(
        store: Arc<dyn InspectionStore>,
        fleet: Arc<dyn FleetDirectory>,
        events: EventPublisher,
    ) -> Self {
        Self { store, fleet, events }
    }

    /// Reserva de alquiler del tenant; cualquier otra cosa es "no encontrada"
    async fn load_rental(&self, tenant_id: Uuid, reservation_id: Uuid) -> AppResult<Reservation> {
        let reservation = self
            .fleet
            .find_reservation(reservation_id)
            .await?
            .filter(|r| r.tenant_id == tenant_id && r.kind == ReservationKind::Rental)
            .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;

        Ok(reservation)
    }

    async fn ensure_not_completed(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<()> {
        let existing = self
            .store
            .find_record(tenant_id, reservation_id, inspection_type)
            .await?;

        match existing {
            Some(record) if record.is_completed() => Err(AppError::Conflict(format!(
                "The {} inspection is already completed",
                inspection_type
            ))),
            _ => Ok(()),
        }
    }

    async fn with_photos(
        &self,
        record: crate::models::InspectionRecord,
    ) -> AppResult<InspectionResponse> {
        let photos = self
            .store
            .list_photos(record.tenant_id, record.reservation_id, record.inspection_type)
            .await?;
        Ok(InspectionResponse { record, photos })
    }

    /// Guarda un borrador: crea el registro si falta, fusiona lecturas y
    /// hace upsert de los slots enviados.
    pub async fn save_draft(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
        user_id: Uuid,
        request: SaveDraftRequest,
    ) -> AppResult<InspectionResponse> {
        if matches!(request.odometer_km, Some(km) if km < 0) {
            return Err(validation_error("Odometer reading must be zero or greater"));
        }
        // El nivel de combustible se guarda tal cual: se compara como texto exacto
        if matches!(&request.fuel_level, Some(fuel) if fuel.trim().is_empty()) {
            return Err(validation_error("Fuel level cannot be empty"));
        }
        let fuel_level = request.fuel_level;
        let photos = photo_slots::draft_slots(&request.photos)?;

        self.load_rental(tenant_id, reservation_id).await?;
        self.ensure_not_completed(tenant_id, reservation_id, inspection_type).await?;

        let record = self
            .store
            .save_draft(&DraftWrite {
                tenant_id,
                reservation_id,
                inspection_type,
                user_id,
                odometer_km: request.odometer_km,
                fuel_level,
                photos,
            })
            .await?;

        debug!("📝 Borrador de {} actualizado para reserva {}", inspection_type, reservation_id);
        self.with_photos(record).await
    }

    /// Cierra la inspección de forma atómica.
    ///
    /// Para una devolución, las advertencias calculadas se persisten (se
    /// reutiliza la fila existente por tipo) y si alguna sigue sin acuse se
    /// devuelve `WarningsPending` sin tocar el registro ni las fotos.
    pub async fn complete(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
        user_id: Uuid,
        request: CompleteInspectionRequest,
    ) -> AppResult<InspectionResponse> {
        if request.odometer_km < 0 {
            return Err(validation_error("Odometer reading must be zero or greater"));
        }
        if request.fuel_level.trim().is_empty() {
            return Err(validation_error("Fuel level is required"));
        }
        let fuel_level = request.fuel_level;
        let photos = photo_slots::completion_slots(&request.photos)?;

        self.load_rental(tenant_id, reservation_id).await?;
        self.ensure_not_completed(tenant_id, reservation_id, inspection_type).await?;

        if inspection_type == InspectionType::Return {
            let pickup = self
                .store
                .find_record(tenant_id, reservation_id, InspectionType::Pickup)
                .await?
                .filter(|record| record.is_completed())
                .ok_or_else(|| {
                    AppError::NotFound(
                        "Pickup inspection must be completed before the return".to_string(),
                    )
                })?;

            let mut surfaced: Vec<InspectionWarning> = Vec::new();
            let drafts = warning_engine::evaluate_return(&pickup, request.odometer_km, &fuel_level);
            for draft in drafts {
                surfaced.push(self.store.upsert_warning(tenant_id, reservation_id, &draft).await?);
            }

            let pending: Vec<PendingWarning> = surfaced
                .iter()
                .filter(|w| !w.is_acknowledged() && !request.acknowledged_warnings.contains(&w.id))
                .map(PendingWarning::from)
                .collect();

            if !pending.is_empty() {
                warn!(
                    "⚠️ Devolución de reserva {} bloqueada: {} advertencia(s) sin acuse",
                    reservation_id,
                    pending.len()
                );
                return Err(AppError::WarningsPending(pending));
            }
        }

        let completed_at = Utc::now();
        let record = self
            .store
            .complete(&CompletionWrite {
                tenant_id,
                reservation_id,
                inspection_type,
                user_id,
                odometer_km: request.odometer_km,
                fuel_level,
                photos,
                acknowledged_warning_ids: request.acknowledged_warnings,
                completed_at,
            })
            .await?;

        info!("✅ Inspección de {} completada para reserva {}", inspection_type, reservation_id);

        self.events.publish(InspectionEvent::Completed {
            tenant_id,
            reservation_id,
            inspection_type,
            completed_by: user_id,
            completed_at,
        });

        self.with_photos(record).await
    }

    pub async fn get_inspection(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<InspectionResponse> {
        self.load_rental(tenant_id, reservation_id).await?;
        let record = self
            .store
            .find_record(tenant_id, reservation_id, inspection_type)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No {} inspection for this reservation",
                    inspection_type
                ))
            })?;

        self.with_photos(record).await
    }

    pub async fn list_warnings(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Vec<InspectionWarning>> {
        self.load_rental(tenant_id, reservation_id).await?;
        self.store.list_warnings(tenant_id, reservation_id).await
    }

    /// Fotos de recogida y devolución por slot
    pub async fn damage_compare(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<DamageCompareResponse> {
        self.load_rental(tenant_id, reservation_id).await?;

        let pickup_photos = self
            .store
            .list_photos(tenant_id, reservation_id, InspectionType::Pickup)
            .await?;
        let return_photos = self
            .store
            .list_photos(tenant_id, reservation_id, InspectionType::Return)
            .await?;

        Ok(DamageCompareResponse { pickup_photos, return_photos })
    }
}
