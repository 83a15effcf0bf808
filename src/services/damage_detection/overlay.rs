//! Imagen de diferencias (mezcla "difference") para revisión humana

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::DetectionError;

/// Compone ambas imágenes normalizadas con |a - b| por canal y la codifica en PNG
pub fn difference_overlay(before: &RgbImage, after: &RgbImage) -> Result<Vec<u8>, DetectionError> {
    let (width, height) = before.dimensions();
    let blended = RgbImage::from_fn(width, height, |x, y| {
        let a = before.get_pixel(x, y);
        let b = after.get_pixel(x, y);
        Rgb([a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2])])
    });

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(blended).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
