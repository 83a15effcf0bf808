//! Motor de detección de daños por comparación de fotos
//!
//! Etapas: normalización → diferencia de píxeles → diferencia de bordes →
//! agrupación en regiones → imagen de diferencias → puntuación.
//! Cálculo puro y determinista sobre bytes ya descargados.

use image::DynamicImage;
use thiserror::Error;

use crate::models::DamagedArea;

pub mod difference;
pub mod normalize;
pub mod overlay;
pub mod regions;
pub mod scoring;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels")]
    EmptyImage,
}

/// Umbrales del motor
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Delta de gris (0-255) a partir del cual un píxel cuenta como distinto
    pub pixel_threshold: u8,
    /// Delta entre magnitudes de borde a partir del cual cuenta como distinto
    pub edge_threshold: u8,
    /// Regiones más pequeñas se descartan como ruido
    pub min_region_pixels: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: 20,
            edge_threshold: 15,
            min_region_pixels: 10,
        }
    }
}

/// Resultado completo de una comparación
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub width: u32,
    pub height: u32,
    pub pixel_diff_pct: f64,
    pub edge_diff_pct: f64,
    pub damage_probability: f64,
    pub confidence_score: f64,
    pub damaged_areas: Vec<DamagedArea>,
    /// PNG de la mezcla "difference"
    pub difference_png: Vec<u8>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct DamageDetectionEngine {
    config: DetectionConfig,
}

impl DamageDetectionEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Decodifica ambas fotos (check-in, check-out) y las compara
    pub fn analyze_bytes(
        &self,
        checkin: &[u8],
        checkout: &[u8],
    ) -> Result<DetectionReport, DetectionError> {
        let before = image::load_from_memory(checkin)?;
        let after = image::load_from_memory(checkout)?;
        self.analyze_images(&before, &after)
    }

    pub fn analyze_images(
        &self,
        before: &DynamicImage,
        after: &DynamicImage,
    ) -> Result<DetectionReport, DetectionError> {
        let pair = normalize::normalize_pair(before, after)?;

        let pixel_delta = difference::absolute_delta(pair.before.as_raw(), pair.after.as_raw());
        let pixel_diff_pct = difference::percent_above(&pixel_delta, self.config.pixel_threshold);

        let edge_delta = difference::absolute_delta(
            &difference::horizontal_edges(&pair.before),
            &difference::horizontal_edges(&pair.after),
        );
        let edge_diff_pct = difference::percent_above(&edge_delta, self.config.edge_threshold);

        let damaged_areas = regions::cluster_regions(
            &pixel_delta,
            pair.width,
            pair.height,
            self.config.pixel_threshold,
            self.config.min_region_pixels,
        );

        let difference_png = overlay::difference_overlay(&pair.before_rgb, &pair.after_rgb)?;
        let scores = scoring::score(pixel_diff_pct, edge_diff_pct);

        Ok(DetectionReport {
            width: pair.width,
            height: pair.height,
            pixel_diff_pct: round2(pixel_diff_pct),
            edge_diff_pct: round2(edge_diff_pct),
            damage_probability: round2(scores.damage_probability),
            confidence_score: round2(scores.confidence_score),
            damaged_areas,
            difference_png,
        })
    }
}
