//! Motor de advertencias de devolución
//!
//! Función pura sobre (recogida completada, datos de devolución).

use serde_json::json;

use crate::models::{InspectionRecord, WarningDraft, WarningType};

/// Kilómetros máximos entre recogida y devolución sin advertencia
pub const KM_OVER_LIMIT_THRESHOLD: i64 = 300;

/// Calcula las advertencias de una devolución frente a su recogida.
///
/// El combustible se compara como texto exacto: "1/2" y "50%" no coinciden.
pub fn evaluate_return(
    pickup: &InspectionRecord,
    return_odometer_km: i64,
    return_fuel_level: &str,
) -> Vec<WarningDraft> {
    let mut warnings = Vec::new();

    if let Some(pickup_km) = pickup.odometer_km {
        let km_diff = return_odometer_km - pickup_km;
        if km_diff > KM_OVER_LIMIT_THRESHOLD {
            warnings.push(WarningDraft {
                warning_type: WarningType::KmOverLimit,
                message: format!(
                    "Vehicle was driven {} km, exceeding the {} km limit",
                    km_diff, KM_OVER_LIMIT_THRESHOLD
                ),
                payload: json!({
                    "kmDiff": km_diff,
                    "pickupKm": pickup_km,
                    "returnKm": return_odometer_km,
                }),
            });
        }
    }

    if let Some(pickup_fuel) = pickup.fuel_level.as_deref() {
        if pickup_fuel != return_fuel_level {
            warnings.push(WarningDraft {
                warning_type: WarningType::FuelMismatch,
                message: format!(
                    "Fuel level at return ({}) differs from pickup ({})",
                    return_fuel_level, pickup_fuel
                ),
                payload: json!({
                    "pickupFuel": pickup_fuel,
                    "returnFuel": return_fuel_level,
                }),
            });
        }
    }

    warnings
}
