//! Puntuación final a partir de los dos porcentajes de diferencia

/// Peso de la diferencia de píxeles en la probabilidad
pub const PIXEL_WEIGHT: f64 = 0.6;
/// Peso de la diferencia de bordes en la probabilidad
pub const EDGE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub damage_probability: f64,
    pub method_agreement: f64,
    pub confidence_score: f64,
}

/// La confianza es la probabilidad escalada por el acuerdo entre métodos
pub fn score(pixel_diff_pct: f64, edge_diff_pct: f64) -> Scores {
    let weighted = PIXEL_WEIGHT * pixel_diff_pct + EDGE_WEIGHT * edge_diff_pct;
    let damage_probability = weighted.clamp(0.0, 100.0);
    let method_agreement = 1.0 - (pixel_diff_pct - edge_diff_pct).abs() / 100.0;
    Scores {
        damage_probability,
        method_agreement,
        confidence_score: damage_probability * method_agreement,
    }
}
