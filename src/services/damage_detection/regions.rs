//! Agrupación de píxeles alterados en regiones (flood fill 4-vecinos,
//! iterativo con pila explícita).

use crate::models::{DamageType, DamagedArea};

/// Conjunto de píxeles visitados, un bit por offset
struct VisitedSet {
    bits: Vec<u64>,
}

impl VisitedSet {
    fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
        }
    }

    /// Marca el offset; devuelve `false` si ya estaba marcado
    fn insert(&mut self, offset: usize) -> bool {
        let (word, bit) = (offset / 64, offset % 64);
        let mask = 1u64 << bit;
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        true
    }
}

struct Cluster {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: usize,
    delta_sum: u64,
}

impl Cluster {
    fn average_delta(&self) -> f64 {
        self.delta_sum as f64 / self.pixels as f64
    }
}

fn classify(average_delta: f64) -> DamageType {
    if average_delta > 100.0 {
        DamageType::Dent
    } else if average_delta > 50.0 {
        DamageType::Scratch
    } else {
        DamageType::Other
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Regiones cuyo delta supera `threshold`, descartando las de menos de
/// `min_pixels` píxeles. Cajas normalizadas a fracciones de la imagen.
pub fn cluster_regions(
    delta: &[u8],
    width: u32,
    height: u32,
    threshold: u8,
    min_pixels: usize,
) -> Vec<DamagedArea> {
    let total = width as usize * height as usize;
    if total == 0 || delta.len() < total {
        return Vec::new();
    }

    let mut visited = VisitedSet::new(total);
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = Vec::new();

    for start in 0..total {
        if delta[start] <= threshold || !visited.insert(start) {
            continue;
        }

        let mut cluster = Cluster {
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
            pixels: 0,
            delta_sum: 0,
        };
        stack.push(start);

        while let Some(offset) = stack.pop() {
            let x = (offset % width as usize) as u32;
            let y = (offset / width as usize) as u32;
            cluster.min_x = cluster.min_x.min(x);
            cluster.min_y = cluster.min_y.min(y);
            cluster.max_x = cluster.max_x.max(x);
            cluster.max_y = cluster.max_y.max(y);
            cluster.pixels += 1;
            cluster.delta_sum += delta[offset] as u64;

            let mut neighbours = [None; 4];
            if x > 0 {
                neighbours[0] = Some(offset - 1);
            }
            if x + 1 < width {
                neighbours[1] = Some(offset + 1);
            }
            if y > 0 {
                neighbours[2] = Some(offset - width as usize);
            }
            if y + 1 < height {
                neighbours[3] = Some(offset + width as usize);
            }

            for next in neighbours.into_iter().flatten() {
                if delta[next] > threshold && visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        if cluster.pixels < min_pixels {
            continue;
        }

        let average_delta = cluster.average_delta();
        regions.push(DamagedArea {
            x: cluster.min_x as f64 / width as f64,
            y: cluster.min_y as f64 / height as f64,
            width: (cluster.max_x - cluster.min_x + 1) as f64 / width as f64,
            height: (cluster.max_y - cluster.min_y + 1) as f64 / height as f64,
            confidence: round2(average_delta / 255.0 * 100.0),
            damage_type: classify(average_delta),
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32, hot: &[(u32, u32, u8)]) -> Vec<u8> {
        let mut delta = vec![0u8; (width * height) as usize];
        for (x, y, value) in hot {
            delta[(y * width + x) as usize] = *value;
        }
        delta
    }

    #[test]
    fn test_small_clusters_are_noise() {
        let hot: Vec<(u32, u32, u8)> = (0..9).map(|x| (x, 0, 200)).collect();
        let delta = grid(20, 5, &hot);
        assert!(cluster_regions(&delta, 20, 5, 20, 10).is_empty());
    }

    #[test]
    fn test_diagonal_pixels_are_separate_clusters() {
        // 4-vecinos: dos bloques que solo se tocan en diagonal no se unen
        let mut hot = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                hot.push((x, y, 120));
                hot.push((x + 4, y + 4, 60));
            }
        }
        let delta = grid(10, 10, &hot);
        let regions = cluster_regions(&delta, 10, 10, 20, 10);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].damage_type, DamageType::Dent);
        assert_eq!(regions[1].damage_type, DamageType::Scratch);
        assert!((regions[0].width - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_region_confidence_and_type() {
        let hot: Vec<(u32, u32, u8)> = (0..10)
            .flat_map(|x| (0..2).map(move |y| (x, y, 40)))
            .collect();
        let delta = grid(10, 10, &hot);
        let regions = cluster_regions(&delta, 10, 10, 20, 10);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].damage_type, DamageType::Other);
        assert_eq!(regions[0].confidence, 15.69);
        assert_eq!((regions[0].x, regions[0].y), (0.0, 0.0));
        assert!((regions[0].height - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_large_snake_does_not_recurse() {
        // Una serpiente que cubre toda la imagen fuerza una pila larga
        let (width, height) = (400u32, 400u32);
        let mut delta = vec![0u8; (width * height) as usize];
        for y in (0..height).step_by(2) {
            for x in 0..width {
                delta[(y * width + x) as usize] = 255;
            }
            let link_x = if (y / 2) % 2 == 0 { width - 1 } else { 0 };
            if y + 1 < height {
                delta[((y + 1) * width + link_x) as usize] = 255;
            }
        }
        let regions = cluster_regions(&delta, width, height, 20, 10);
        assert_eq!(regions.len(), 1);
    }
}
