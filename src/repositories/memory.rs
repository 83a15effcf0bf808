//! Implementaciones en memoria de los repositorios
//!
//! Usadas por los tests y por `STORAGE_BACKEND=memory`. El cierre de
//! inspección se aplica sobre una copia de las tablas que solo sustituye
//! al original si todos los pasos terminan bien.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use super::{DetectionStore, FleetDirectory, InspectionStore};
use crate::models::{
    CompletionWrite, DamageDetection, DetectionOutcome, DetectionRun, DetectionStatus,
    DraftWrite, InspectionPhoto, InspectionRecord, InspectionStatus, InspectionType,
    InspectionWarning, PhotoSlot, Reservation, ReservationKind, VerificationWrite,
    WarningDraft, WarningType,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

type RecordKey = (Uuid, Uuid, InspectionType);
type PhotoKey = (Uuid, Uuid, InspectionType, i16);
type WarningKey = (Uuid, Uuid, WarningType);

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
}

/// Punto del cierre en el que se inyecta un fallo (solo una vez)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionFault {
    AfterRecordUpdate,
    AfterPhotoDelete,
    AfterPhotoInsert,
    AfterWarningAcknowledge,
}

#[derive(Debug, Default, Clone)]
struct InspectionTables {
    records: HashMap<RecordKey, InspectionRecord>,
    photos: HashMap<PhotoKey, InspectionPhoto>,
    warnings: HashMap<WarningKey, InspectionWarning>,
}

impl InspectionTables {
    fn upsert_photo(&mut self, record: RecordKey, photo: &PhotoSlot) {
        let (tenant_id, reservation_id, inspection_type) = record;
        let key = (tenant_id, reservation_id, inspection_type, photo.slot_index);
        let now = Utc::now();
        self.photos
            .entry(key)
            .and_modify(|existing| {
                existing.media_url = photo.media_url.clone();
                existing.created_at = now;
            })
            .or_insert_with(|| InspectionPhoto {
                id: Uuid::new_v4(),
                tenant_id,
                reservation_id,
                inspection_type,
                slot_index: photo.slot_index,
                media_url: photo.media_url.clone(),
                created_at: now,
            });
    }
}

#[derive(Default)]
pub struct MemoryInspectionStore {
    tables: Mutex<InspectionTables>,
    fault: Mutex<Option<CompletionFault>>,
}

impl MemoryInspectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// El próximo `complete` fallará en el paso indicado
    pub fn inject_completion_fault(&self, fault: CompletionFault) -> AppResult<()> {
        *lock(&self.fault)? = Some(fault);
        Ok(())
    }

    fn check_fault(armed: &mut Option<CompletionFault>, step: CompletionFault) -> AppResult<()> {
        if *armed == Some(step) {
            *armed = None;
            return Err(AppError::Internal(format!("Injected failure {:?}", step)));
        }
        Ok(())
    }
}

#[async_trait]
impl InspectionStore for MemoryInspectionStore {
    async fn find_record(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Option<InspectionRecord>> {
        let tables = lock(&self.tables)?;
        Ok(tables.records.get(&(tenant_id, reservation_id, inspection_type)).cloned())
    }

    async fn list_photos(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Vec<InspectionPhoto>> {
        let tables = lock(&self.tables)?;
        let mut photos: Vec<InspectionPhoto> = tables
            .photos
            .values()
            .filter(|p| {
                p.tenant_id == tenant_id
                    && p.reservation_id == reservation_id
                    && p.inspection_type == inspection_type
            })
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.slot_index);
        Ok(photos)
    }

    async fn save_draft(&self, draft: &DraftWrite) -> AppResult<InspectionRecord> {
        let mut tables = lock(&self.tables)?;
        let key = (draft.tenant_id, draft.reservation_id, draft.inspection_type);

        let record = tables.records.entry(key).or_insert_with(|| {
            InspectionRecord::new_draft(
                draft.tenant_id,
                draft.reservation_id,
                draft.inspection_type,
                draft.user_id,
            )
        });
        if record.is_completed() {
            return Err(AppError::Conflict(format!(
                "The {} inspection is already completed",
                draft.inspection_type
            )));
        }
        if let Some(odometer_km) = draft.odometer_km {
            record.odometer_km = Some(odometer_km);
        }
        if let Some(fuel_level) = &draft.fuel_level {
            record.fuel_level = Some(fuel_level.clone());
        }
        record.updated_at = Utc::now();
        let record = record.clone();

        for photo in &draft.photos {
            tables.upsert_photo(key, photo);
        }

        Ok(record)
    }

    async fn complete(&self, completion: &CompletionWrite) -> AppResult<InspectionRecord> {
        let mut tables = lock(&self.tables)?;
        let mut armed = lock(&self.fault)?;
        let mut staged = tables.clone();
        let key = (completion.tenant_id, completion.reservation_id, completion.inspection_type);

        let record = staged.records.entry(key).or_insert_with(|| {
            InspectionRecord::new_draft(
                completion.tenant_id,
                completion.reservation_id,
                completion.inspection_type,
                completion.user_id,
            )
        });
        if record.is_completed() {
            return Err(AppError::Conflict(format!(
                "The {} inspection is already completed",
                completion.inspection_type
            )));
        }
        record.odometer_km = Some(completion.odometer_km);
        record.fuel_level = Some(completion.fuel_level.clone());
        record.status = InspectionStatus::Completed;
        record.completed_at = Some(completion.completed_at);
        record.updated_at = Utc::now();
        let record = record.clone();
        Self::check_fault(&mut armed, CompletionFault::AfterRecordUpdate)?;

        staged.photos.retain(|(tenant_id, reservation_id, inspection_type, _), _| {
            !(*tenant_id == completion.tenant_id
                && *reservation_id == completion.reservation_id
                && *inspection_type == completion.inspection_type)
        });
        Self::check_fault(&mut armed, CompletionFault::AfterPhotoDelete)?;

        for photo in &completion.photos {
            staged.upsert_photo(key, photo);
        }
        Self::check_fault(&mut armed, CompletionFault::AfterPhotoInsert)?;

        for warning in staged.warnings.values_mut() {
            if warning.tenant_id == completion.tenant_id
                && warning.reservation_id == completion.reservation_id
                && completion.acknowledged_warning_ids.contains(&warning.id)
                && !warning.is_acknowledged()
            {
                warning.acknowledged_by = Some(completion.user_id);
                warning.acknowledged_at = Some(completion.completed_at);
            }
        }
        Self::check_fault(&mut armed, CompletionFault::AfterWarningAcknowledge)?;

        *tables = staged;
        Ok(record)
    }

    async fn upsert_warning(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        warning: &WarningDraft,
    ) -> AppResult<InspectionWarning> {
        let mut tables = lock(&self.tables)?;
        let stored = tables
            .warnings
            .entry((tenant_id, reservation_id, warning.warning_type))
            .and_modify(|existing| {
                if !existing.is_acknowledged() {
                    existing.message = warning.message.clone();
                    existing.payload = Json(warning.payload.clone());
                }
            })
            .or_insert_with(|| InspectionWarning {
                id: Uuid::new_v4(),
                tenant_id,
                reservation_id,
                warning_type: warning.warning_type,
                message: warning.message.clone(),
                payload: Json(warning.payload.clone()),
                acknowledged_by: None,
                acknowledged_at: None,
                created_at: Utc::now(),
            });
        Ok(stored.clone())
    }

    async fn list_warnings(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Vec<InspectionWarning>> {
        let tables = lock(&self.tables)?;
        let mut warnings: Vec<InspectionWarning> = tables
            .warnings
            .values()
            .filter(|w| w.tenant_id == tenant_id && w.reservation_id == reservation_id)
            .cloned()
            .collect();
        warnings.sort_by_key(|w| w.created_at);
        Ok(warnings)
    }
}

#[derive(Default)]
pub struct MemoryDetectionStore {
    detections: Mutex<HashMap<Uuid, DamageDetection>>,
}

impl MemoryDetectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DetectionStore for MemoryDetectionStore {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Option<DamageDetection>> {
        let detections = lock(&self.detections)?;
        Ok(detections
            .values()
            .find(|d| {
                d.tenant_id == tenant_id
                    && d.vehicle_id == vehicle_id
                    && d.reservation_id == reservation_id
            })
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<DamageDetection>> {
        let detections = lock(&self.detections)?;
        Ok(detections.get(&id).filter(|d| d.tenant_id == tenant_id).cloned())
    }

    async fn start_run(&self, run: &DetectionRun) -> AppResult<Option<DamageDetection>> {
        let mut detections = lock(&self.detections)?;
        let now = Utc::now();

        let existing = detections.values_mut().find(|d| {
            d.tenant_id == run.tenant_id
                && d.vehicle_id == run.vehicle_id
                && d.reservation_id == run.reservation_id
        });

        if let Some(detection) = existing {
            if detection.status.is_human_verified() {
                return Ok(None);
            }
            detection.checkin_photo_urls = run.checkin_photo_urls.clone();
            detection.checkout_photo_urls = run.checkout_photo_urls.clone();
            detection.status = DetectionStatus::Processing;
            detection.damage_probability = None;
            detection.confidence_score = None;
            detection.damaged_areas = Json(Vec::new());
            detection.difference_image_url = None;
            detection.error_message = None;
            detection.processed_at = None;
            detection.updated_at = now;
            return Ok(Some(detection.clone()));
        }

        let detection = DamageDetection {
            id: Uuid::new_v4(),
            tenant_id: run.tenant_id,
            vehicle_id: run.vehicle_id,
            reservation_id: run.reservation_id,
            checkin_photo_urls: run.checkin_photo_urls.clone(),
            checkout_photo_urls: run.checkout_photo_urls.clone(),
            damage_probability: None,
            confidence_score: None,
            damaged_areas: Json(Vec::new()),
            difference_image_url: None,
            status: DetectionStatus::Processing,
            error_message: None,
            processed_at: None,
            verified_by: None,
            verified_at: None,
            verification_notes: None,
            created_at: now,
            updated_at: now,
        };
        detections.insert(detection.id, detection.clone());
        Ok(Some(detection))
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        outcome: &DetectionOutcome,
    ) -> AppResult<DamageDetection> {
        let mut detections = lock(&self.detections)?;
        let detection = detections
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Damage detection", &id))?;
        let now = Utc::now();
        detection.status = DetectionStatus::Completed;
        detection.damage_probability = Some(outcome.damage_probability);
        detection.confidence_score = Some(outcome.confidence_score);
        detection.damaged_areas = Json(outcome.damaged_areas.clone());
        detection.difference_image_url = Some(outcome.difference_image_url.clone());
        detection.error_message = None;
        detection.processed_at = Some(now);
        detection.updated_at = now;
        Ok(detection.clone())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<DamageDetection> {
        let mut detections = lock(&self.detections)?;
        let detection = detections
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Damage detection", &id))?;
        let now = Utc::now();
        detection.status = DetectionStatus::Failed;
        detection.error_message = Some(error_message.to_string());
        detection.processed_at = Some(now);
        detection.updated_at = now;
        Ok(detection.clone())
    }

    async fn verify(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        verification: &VerificationWrite,
    ) -> AppResult<Option<DamageDetection>> {
        let mut detections = lock(&self.detections)?;
        let Some(detection) = detections
            .get_mut(&id)
            .filter(|d| d.tenant_id == tenant_id && d.status == DetectionStatus::Completed)
        else {
            return Ok(None);
        };
        let now = Utc::now();
        detection.status = if verification.is_damage {
            DetectionStatus::Verified
        } else {
            DetectionStatus::FalsePositive
        };
        detection.verified_by = Some(verification.verified_by);
        detection.verified_at = Some(now);
        detection.verification_notes = verification.notes.clone();
        detection.updated_at = now;
        Ok(Some(detection.clone()))
    }

    async fn list_for_vehicle(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Vec<DamageDetection>> {
        let detections = lock(&self.detections)?;
        let mut found: Vec<DamageDetection> = detections
            .values()
            .filter(|d| d.tenant_id == tenant_id && d.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// Directorio de reservas y vehículos cargado a mano
#[derive(Default)]
pub struct MemoryFleetDirectory {
    reservations: Mutex<HashMap<Uuid, Reservation>>,
    vehicles: Mutex<HashMap<Uuid, Uuid>>,
}

impl MemoryFleetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vehicle(&self, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        lock(&self.vehicles)?.insert(vehicle_id, tenant_id);
        Ok(())
    }

    /// Registra un vehículo y una reserva de alquiler sobre él
    pub fn add_rental(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<()> {
        self.add_reservation(Reservation {
            id: reservation_id,
            tenant_id,
            vehicle_id,
            kind: ReservationKind::Rental,
        })
    }

    pub fn add_reservation(&self, reservation: Reservation) -> AppResult<()> {
        self.add_vehicle(reservation.tenant_id, reservation.vehicle_id)?;
        lock(&self.reservations)?.insert(reservation.id, reservation);
        Ok(())
    }
}

#[async_trait]
impl FleetDirectory for MemoryFleetDirectory {
    async fn find_reservation(&self, reservation_id: Uuid) -> AppResult<Option<Reservation>> {
        Ok(lock(&self.reservations)?.get(&reservation_id).cloned())
    }

    async fn vehicle_belongs_to(&self, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<bool> {
        Ok(lock(&self.vehicles)?.get(&vehicle_id) == Some(&tenant_id))
    }
}
