use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::InspectionStore;
use crate::models::{
    CompletionWrite, DraftWrite, InspectionPhoto, InspectionRecord, InspectionType,
    InspectionWarning, PhotoSlot, WarningDraft,
};
use crate::utils::errors::{AppError, AppResult};

fn already_completed(inspection_type: InspectionType) -> AppError {
    AppError::Conflict(format!("The {} inspection is already completed", inspection_type))
}

pub struct PgInspectionRepository {
    pool: PgPool,
}

impl PgInspectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_photo(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
        photo: &PhotoSlot,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inspection_photos
                (id, tenant_id, reservation_id, inspection_type, slot_index, media_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (tenant_id, reservation_id, inspection_type, slot_index)
            DO UPDATE SET media_url = EXCLUDED.media_url, created_at = NOW()
            "#
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(reservation_id)
        .bind(inspection_type)
        .bind(photo.slot_index)
        .bind(&photo.media_url)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl InspectionStore for PgInspectionRepository {
    async fn find_record(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Option<InspectionRecord>> {
        let record = sqlx::query_as::<_, InspectionRecord>(
            r#"
            SELECT * FROM inspection_records
            WHERE tenant_id = $1 AND reservation_id = $2 AND inspection_type = $3
            "#
        )
        .bind(tenant_id)
        .bind(reservation_id)
        .bind(inspection_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_photos(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
    ) -> AppResult<Vec<InspectionPhoto>> {
        let photos = sqlx::query_as::<_, InspectionPhoto>(
            r#"
            SELECT * FROM inspection_photos
            WHERE tenant_id = $1 AND reservation_id = $2 AND inspection_type = $3
            ORDER BY slot_index ASC
            "#
        )
        .bind(tenant_id)
        .bind(reservation_id)
        .bind(inspection_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn save_draft(&self, draft: &DraftWrite) -> AppResult<InspectionRecord> {
        let mut tx = self.pool.begin().await?;

        // El DO UPDATE solo aplica sobre borradores: un registro completado no devuelve fila
        let record = sqlx::query_as::<_, InspectionRecord>(
            r#"
            INSERT INTO inspection_records
                (id, tenant_id, reservation_id, inspection_type, odometer_km, fuel_level,
                 status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, NOW(), NOW())
            ON CONFLICT (tenant_id, reservation_id, inspection_type) DO UPDATE SET
                odometer_km = COALESCE(EXCLUDED.odometer_km, inspection_records.odometer_km),
                fuel_level = COALESCE(EXCLUDED.fuel_level, inspection_records.fuel_level),
                updated_at = NOW()
            WHERE inspection_records.status = 'draft'
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(draft.tenant_id)
        .bind(draft.reservation_id)
        .bind(draft.inspection_type)
        .bind(draft.odometer_km)
        .bind(&draft.fuel_level)
        .bind(draft.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| already_completed(draft.inspection_type))?;

        for photo in &draft.photos {
            Self::upsert_photo(
                &mut tx,
                draft.tenant_id,
                draft.reservation_id,
                draft.inspection_type,
                photo,
            )
            .await?;
        }

        tx.commit().await?;
        debug!(
            "💾 Borrador {} guardado para reserva {} ({} fotos)",
            draft.inspection_type,
            draft.reservation_id,
            draft.photos.len()
        );

        Ok(record)
    }

    async fn complete(&self, completion: &CompletionWrite) -> AppResult<InspectionRecord> {
        // Cualquier `?` antes del commit descarta la transacción (rollback)
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, InspectionRecord>(
            r#"
            INSERT INTO inspection_records
                (id, tenant_id, reservation_id, inspection_type, odometer_km, fuel_level,
                 status, completed_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8, NOW(), NOW())
            ON CONFLICT (tenant_id, reservation_id, inspection_type) DO UPDATE SET
                odometer_km = EXCLUDED.odometer_km,
                fuel_level = EXCLUDED.fuel_level,
                status = 'completed',
                completed_at = EXCLUDED.completed_at,
                updated_at = NOW()
            WHERE inspection_records.status = 'draft'
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(completion.tenant_id)
        .bind(completion.reservation_id)
        .bind(completion.inspection_type)
        .bind(completion.odometer_km)
        .bind(&completion.fuel_level)
        .bind(completion.completed_at)
        .bind(completion.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| already_completed(completion.inspection_type))?;

        sqlx::query(
            r#"
            DELETE FROM inspection_photos
            WHERE tenant_id = $1 AND reservation_id = $2 AND inspection_type = $3
            "#
        )
        .bind(completion.tenant_id)
        .bind(completion.reservation_id)
        .bind(completion.inspection_type)
        .execute(&mut *tx)
        .await?;

        for photo in &completion.photos {
            Self::upsert_photo(
                &mut tx,
                completion.tenant_id,
                completion.reservation_id,
                completion.inspection_type,
                photo,
            )
            .await?;
        }

        if !completion.acknowledged_warning_ids.is_empty() {
            sqlx::query(
                r#"
                UPDATE inspection_warnings
                SET acknowledged_by = $1, acknowledged_at = $2
                WHERE tenant_id = $3 AND reservation_id = $4
                  AND id = ANY($5) AND acknowledged_at IS NULL
                "#
            )
            .bind(completion.user_id)
            .bind(completion.completed_at)
            .bind(completion.tenant_id)
            .bind(completion.reservation_id)
            .bind(&completion.acknowledged_warning_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(record)
    }

    async fn upsert_warning(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
        warning: &WarningDraft,
    ) -> AppResult<InspectionWarning> {
        // Conserva el id existente; el contenido solo se refresca mientras no haya acuse
        let stored = sqlx::query_as::<_, InspectionWarning>(
            r#"
            INSERT INTO inspection_warnings
                (id, tenant_id, reservation_id, warning_type, message, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, reservation_id, warning_type) DO UPDATE SET
                message = CASE WHEN inspection_warnings.acknowledged_at IS NULL
                    THEN EXCLUDED.message ELSE inspection_warnings.message END,
                payload = CASE WHEN inspection_warnings.acknowledged_at IS NULL
                    THEN EXCLUDED.payload ELSE inspection_warnings.payload END
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(reservation_id)
        .bind(warning.warning_type)
        .bind(&warning.message)
        .bind(Json(&warning.payload))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_warnings(
        &self,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Vec<InspectionWarning>> {
        let warnings = sqlx::query_as::<_, InspectionWarning>(
            r#"
            SELECT * FROM inspection_warnings
            WHERE tenant_id = $1 AND reservation_id = $2
            ORDER BY created_at ASC
            "#
        )
        .bind(tenant_id)
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(warnings)
    }
}
