//! Repositorios
//!
//! Contratos de almacenamiento del flujo de inspección y de la detección
//! de daños. Cada contrato tiene una implementación PostgreSQL y una en
//! memoria (tests y modo demo).

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CompletionWrite, DamageDetection, DetectionOutcome, DetectionRun, DraftWrite,
    InspectionPhoto, InspectionRecord, InspectionType, InspectionWarning, Reservation,
    VerificationWrite, WarningDraft,
};
use crate::utils::errors::AppResult;

pub mod detection_repository;
pub mod inspection_repository;
pub mod memory;
pub mod reservation_repository;

pub use detection_repository::PgDetectionRepository;
pub use inspection_repository::PgInspectionRepository;
pub use memory::{
    CompletionFault, MemoryDetectionStore, MemoryFleetDirectory, MemoryInspectionStore,
};
pub use reservation_repository::PgFleetDirectory;

/// Registros de inspección, slots fotográficos y advertencias
#[async_trait]
pub trait InspectionStore: Send + Sync {
    async fn find_record(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Option<InspectionRecord>>;

    /// Fotos ordenadas por slot
    async fn list_photos(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Vec<InspectionPhoto>>;

    /// Crea el borrador si no existe, fusiona odómetro/combustible y hace
    /// upsert de cada slot. `Conflict` si el registro ya está completado.
    async fn save_draft(&self, draft: &DraftWrite) -> AppResult<InspectionRecord>;

    /// Cierre atómico: estado, reemplazo completo de fotos y acuse de
    /// advertencias en una sola transacción.
    async fn complete(&self, completion: &CompletionWrite) -> AppResult<InspectionRecord>;

    /// Crea la advertencia o devuelve la existente para (reserva, tipo)
    async fn upsert_warning(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        warning: &WarningDraft,
    ) -> AppResult<InspectionWarning>;

    async fn list_warnings(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Vec<InspectionWarning>>;
}

/// Ejecuciones de detección de daños y verificación humana
#[async_trait]
pub trait DetectionStore: Send + Sync {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Option<DamageDetection>>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<DamageDetection>>;

    /// Crea o reinicia la fila en `processing`. `None` si ya fue verificada.
    async fn start_run(&self, run: &DetectionRun) -> AppResult<Option<DamageDetection>>;

    async fn mark_completed(
        &self,
        id: Uuid,
        outcome: &DetectionOutcome,
    ) -> AppResult<DamageDetection>;

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<DamageDetection>;

    /// Anotación humana. `None` si la detección no está en `completed`.
    async fn verify(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        verification: &VerificationWrite,
    ) -> AppResult<Option<DamageDetection>>;

    async fn list_for_vehicle(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Vec<DamageDetection>>;
}

/// Consultas al back office CRUD (reservas y vehículos)
#[async_trait]
pub trait FleetDirectory: Send + Sync {
    async fn find_reservation(&self, reservation_id: Uuid) -> AppResult<Option<Reservation>>;

    async fn vehicle_belongs_to(&self, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<bool>;
}
