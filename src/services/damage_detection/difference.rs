//! Diferencia de píxeles y diferencia de bordes (Sobel horizontal)

use image::GrayImage;

/// Kernel Sobel horizontal 3x3
const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Delta absoluto por píxel entre dos buffers de igual tamaño
pub fn absolute_delta(before: &[u8], after: &[u8]) -> Vec<u8> {
    before
        .iter()
        .zip(after.iter())
        .map(|(a, b)| a.abs_diff(*b))
        .collect()
}

/// Porcentaje de píxeles cuyo delta supera el umbral
pub fn percent_above(delta: &[u8], threshold: u8) -> f64 {
    if delta.is_empty() {
        return 0.0;
    }
    let differing = delta.iter().filter(|d| **d > threshold).count();
    differing as f64 / delta.len() as f64 * 100.0
}

/// Magnitud del gradiente horizontal, bordes replicados, saturada a 255
pub fn horizontal_edges(image: &GrayImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);
    let raw = image.as_raw();
    let mut edges = Vec::with_capacity(raw.len());

    for y in 0..h {
        for x in 0..w {
            let mut sum = 0i32;
            for (ky, row) in SOBEL_X.iter().enumerate() {
                let sy = (y + ky as i64 - 1).clamp(0, h - 1);
                for (kx, weight) in row.iter().enumerate() {
                    if *weight == 0 {
                        continue;
                    }
                    let sx = (x + kx as i64 - 1).clamp(0, w - 1);
                    sum += weight * raw[(sy * w + sx) as usize] as i32;
                }
            }
            edges.push(sum.unsigned_abs().min(255) as u8);
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_percent_above_is_strict() {
        let delta = vec![0, 20, 21, 255];
        assert_eq!(percent_above(&delta, 20), 50.0);
        assert_eq!(percent_above(&[], 20), 0.0);
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let image = GrayImage::from_pixel(8, 8, Luma([90]));
        assert!(horizontal_edges(&image).iter().all(|e| *e == 0));
    }

    #[test]
    fn test_vertical_step_produces_edges() {
        let image = GrayImage::from_fn(6, 3, |x, _| if x < 3 { Luma([0]) } else { Luma([100]) });
        let edges = horizontal_edges(&image);
        let row = 6;
        // columnas 2 y 3 rodean el escalón
        assert_eq!(edges[row + 2], 255);
        assert_eq!(edges[row + 3], 255);
        assert_eq!(edges[row], 0);
        assert_eq!(edges[row + 5], 0);
    }
}
