//! Reserva vista desde el flujo de inspección (solo lectura)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de reserva. Solo los alquileres pasan por recogida/devolución.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationKind {
    Rental,
    Marketplace,
}

impl ReservationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rental" => Some(ReservationKind::Rental),
            "marketplace" => Some(ReservationKind::Marketplace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vehicle_id: Uuid,
    pub kind: ReservationKind,
}
