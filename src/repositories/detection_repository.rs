use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::DetectionStore;
use crate::models::{
    DamageDetection, DetectionOutcome, DetectionRun, DetectionStatus, VerificationWrite,
};
use crate::utils::errors::{not_found_error, AppResult};

pub struct PgDetectionRepository {
    pool: PgPool,
}

impl PgDetectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DetectionStore for PgDetectionRepository {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        reservation_id: Uuid,
    ) -> AppResult<Option<DamageDetection>> {
        let detection = sqlx::query_as::<_, DamageDetection>(
            r#"
            SELECT * FROM damage_detections
            WHERE tenant_id = $1 AND vehicle_id = $2 AND reservation_id = $3
            "#
        )
        .bind(tenant_id)
        .bind(vehicle_id)
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detection)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<DamageDetection>> {
        let detection = sqlx::query_as::<_, DamageDetection>(
            "SELECT * FROM damage_detections WHERE id = $1 AND tenant_id = $2"
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detection)
    }

    async fn start_run(&self, run: &DetectionRun) -> AppResult<Option<DamageDetection>> {
        let detection = sqlx::query_as::<_, DamageDetection>(
            r#"
            INSERT INTO damage_detections
                (id, tenant_id, vehicle_id, reservation_id, checkin_photo_urls,
                 checkout_photo_urls, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'processing', NOW(), NOW())
            ON CONFLICT (tenant_id, vehicle_id, reservation_id) DO UPDATE SET
                checkin_photo_urls = EXCLUDED.checkin_photo_urls,
                checkout_photo_urls = EXCLUDED.checkout_photo_urls,
                status = 'processing',
                damage_probability = NULL,
                confidence_score = NULL,
                damaged_areas = '[]'::jsonb,
                difference_image_url = NULL,
                error_message = NULL,
                processed_at = NULL,
                updated_at = NOW()
            WHERE damage_detections.status NOT IN ('verified', 'false_positive')
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(run.tenant_id)
        .bind(run.vehicle_id)
        .bind(run.reservation_id)
        .bind(&run.checkin_photo_urls)
        .bind(&run.checkout_photo_urls)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detection)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        outcome: &DetectionOutcome,
    ) -> AppResult<DamageDetection> {
        sqlx::query_as::<_, DamageDetection>(
            r#"
            UPDATE damage_detections SET
                status = 'completed',
                damage_probability = $2,
                confidence_score = $3,
                damaged_areas = $4,
                difference_image_url = $5,
                error_message = NULL,
                processed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(outcome.damage_probability)
        .bind(outcome.confidence_score)
        .bind(Json(&outcome.damaged_areas))
        .bind(&outcome.difference_image_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Damage detection", &id))
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<DamageDetection> {
        sqlx::query_as::<_, DamageDetection>(
            r#"
            UPDATE damage_detections SET
                status = 'failed',
                error_message = $2,
                processed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(error_message)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Damage detection", &id))
    }

    async fn verify(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        verification: &VerificationWrite,
    ) -> AppResult<Option<DamageDetection>> {
        let status = if verification.is_damage {
            DetectionStatus::Verified
        } else {
            DetectionStatus::FalsePositive
        };

        let detection = sqlx::query_as::<_, DamageDetection>(
            r#"
            UPDATE damage_detections SET
                status = $3,
                verified_by = $4,
                verified_at = NOW(),
                verification_notes = $5,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'completed'
            RETURNING *
            "#
        )
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .bind(verification.verified_by)
        .bind(&verification.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detection)
    }

    async fn list_for_vehicle(
        &self,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> AppResult<Vec<DamageDetection>> {
        let detections = sqlx::query_as::<_, DamageDetection>(
            r#"
            SELECT * FROM damage_detections
            WHERE tenant_id = $1 AND vehicle_id = $2
            ORDER BY created_at DESC
            "#
        )
        .bind(tenant_id)
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DamageType, DamagedArea};

    fn run(tenant_id: Uuid, vehicle_id: Uuid, reservation_id: Uuid, url: &str) -> DetectionRun {
        DetectionRun {
            tenant_id,
            vehicle_id,
            reservation_id,
            checkin_photo_urls: vec![format!("/uploads/inspections/{}-in.jpg", url)],
            checkout_photo_urls: vec![format!("/uploads/inspections/{}-out.jpg", url)],
        }
    }

    fn outcome() -> DetectionOutcome {
        DetectionOutcome {
            damage_probability: 42.5,
            confidence_score: 30.0,
            damaged_areas: vec![DamagedArea {
                x: 0.25,
                y: 0.4,
                width: 0.1,
                height: 0.1,
                confidence: 0.8,
                damage_type: DamageType::Dent,
            }],
            difference_image_url: "/uploads/damage-detections/diff.png".to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_rerun_resets_the_same_row(pool: PgPool) {
        let repo = PgDetectionRepository::new(pool);
        let tenant_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();

        let first = repo
            .start_run(&run(tenant_id, vehicle_id, reservation_id, "a"))
            .await
            .unwrap()
            .unwrap();
        repo.mark_failed(first.id, "decode error").await.unwrap();

        let second = repo
            .start_run(&run(tenant_id, vehicle_id, reservation_id, "b"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, DetectionStatus::Processing);
        assert!(second.error_message.is_none());
        assert_eq!(second.checkin_photo_urls, vec!["/uploads/inspections/b-in.jpg"]);

        let completed = repo.mark_completed(second.id, &outcome()).await.unwrap();
        assert_eq!(completed.status, DetectionStatus::Completed);
        assert_eq!(completed.damaged_areas.0, outcome().damaged_areas);
        assert!(completed.processed_at.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_verified_detection_refuses_a_new_run(pool: PgPool) {
        let repo = PgDetectionRepository::new(pool);
        let tenant_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let reviewer = Uuid::new_v4();

        let started = repo
            .start_run(&run(tenant_id, vehicle_id, reservation_id, "a"))
            .await
            .unwrap()
            .unwrap();

        // Aún en processing: no se puede verificar
        let early = VerificationWrite { verified_by: reviewer, is_damage: true, notes: None };
        assert!(repo.verify(tenant_id, started.id, &early).await.unwrap().is_none());

        repo.mark_completed(started.id, &outcome()).await.unwrap();
        let verification = VerificationWrite {
            verified_by: reviewer,
            is_damage: false,
            notes: Some("reflection".to_string()),
        };
        let verified = repo
            .verify(tenant_id, started.id, &verification)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verified.status, DetectionStatus::FalsePositive);
        assert_eq!(verified.verified_by, Some(reviewer));
        assert_eq!(verified.damage_probability, Some(42.5));

        let rerun = repo
            .start_run(&run(tenant_id, vehicle_id, reservation_id, "b"))
            .await
            .unwrap();
        assert!(rerun.is_none());
        assert!(repo.verify(tenant_id, started.id, &verification).await.unwrap().is_none());

        let stored = repo
            .find_by_key(tenant_id, vehicle_id, reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, DetectionStatus::FalsePositive);
        assert_eq!(stored.checkin_photo_urls, vec!["/uploads/inspections/a-in.jpg"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_lookups_are_scoped_by_tenant(pool: PgPool) {
        let repo = PgDetectionRepository::new(pool);
        let (tenant_id, vehicle_id) = (Uuid::new_v4(), Uuid::new_v4());
        let started = repo
            .start_run(&run(tenant_id, vehicle_id, Uuid::new_v4(), "a"))
            .await
            .unwrap()
            .unwrap();

        assert!(repo.find_by_id(Uuid::new_v4(), started.id).await.unwrap().is_none());
        assert!(repo.list_for_vehicle(Uuid::new_v4(), vehicle_id).await.unwrap().is_empty());
        assert_eq!(repo.list_for_vehicle(tenant_id, vehicle_id).await.unwrap().len(), 1);
    }
}
