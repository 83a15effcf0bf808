use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::FleetDirectory;
use crate::models::{Reservation, ReservationKind};
use crate::utils::errors::{AppError, AppResult};

/// Lecturas sobre las tablas `reservations` y `vehicles` del back office
pub struct PgFleetDirectory {
    pool: PgPool,
}

impl PgFleetDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetDirectory for PgFleetDirectory {
    async fn find_reservation(&self, reservation_id: Uuid) -> AppResult<Option<Reservation>> {
        let row: Option<(Uuid, Uuid, Uuid, String)> = sqlx::query_as(
            "SELECT id, tenant_id, vehicle_id, kind FROM reservations WHERE id = $1"
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, tenant_id, vehicle_id, kind)| {
            let kind = ReservationKind::parse(&kind)
                .ok_or_else(|| AppError::Internal(format!("Unknown reservation kind '{}'", kind)))?;
            Ok(Reservation { id, tenant_id, vehicle_id, kind })
        })
        .transpose()
    }

    async fn vehicle_belongs_to(&self, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND tenant_id = $2)"
        )
        .bind(vehicle_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
