//! Normalización: ambas imágenes al mismo tamaño (el menor ancho y el
//! menor alto), recortadas en modo "cover" y pasadas a escala de grises.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};

use super::DetectionError;

/// Par de imágenes alineadas píxel a píxel
pub struct NormalizedPair {
    pub width: u32,
    pub height: u32,
    pub before: GrayImage,
    pub after: GrayImage,
    pub before_rgb: RgbImage,
    pub after_rgb: RgbImage,
}

fn cover_fit(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        image.resize_to_fill(width, height, FilterType::Triangle)
    }
}

pub fn normalize_pair(
    before: &DynamicImage,
    after: &DynamicImage,
) -> Result<NormalizedPair, DetectionError> {
    let (bw, bh) = before.dimensions();
    let (aw, ah) = after.dimensions();
    if bw == 0 || bh == 0 || aw == 0 || ah == 0 {
        return Err(DetectionError::EmptyImage);
    }

    let width = bw.min(aw);
    let height = bh.min(ah);
    let before = cover_fit(before, width, height);
    let after = cover_fit(after, width, height);

    Ok(NormalizedPair {
        width,
        height,
        before: before.to_luma8(),
        after: after.to_luma8(),
        before_rgb: before.to_rgb8(),
        after_rgb: after.to_rgb8(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_pair_uses_smallest_common_size() {
        let before = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([10, 10, 10])));
        let after = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 90, Rgb([10, 10, 10])));
        let pair = normalize_pair(&before, &after).unwrap();
        assert_eq!((pair.width, pair.height), (100, 80));
        assert_eq!(pair.before.dimensions(), (100, 80));
        assert_eq!(pair.after.dimensions(), (100, 80));
    }

    #[test]
    fn test_empty_image_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let other = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(normalize_pair(&empty, &other), Err(DetectionError::EmptyImage)));
    }
}
