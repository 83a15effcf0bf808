#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GenericImage, Rgb, RgbImage};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use fleet_inspection::config::EnvironmentConfig;
use fleet_inspection::dto::{CompleteInspectionRequest, PhotoInput};
use fleet_inspection::repositories::{
    MemoryDetectionStore, MemoryFleetDirectory, MemoryInspectionStore,
};
use fleet_inspection::services::{InspectionEvent, MemoryFileStore};
use fleet_inspection::state::AppState;
use fleet_inspection::{assemble, Stores};

pub struct Harness {
    pub state: AppState,
    pub events: Receiver<InspectionEvent>,
    pub inspections: Arc<MemoryInspectionStore>,
    pub detections: Arc<MemoryDetectionStore>,
    pub fleet: Arc<MemoryFleetDirectory>,
    pub files: Arc<MemoryFileStore>,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub reservation_id: Uuid,
}

impl Harness {
    /// Un tenant con un vehículo y una reserva de alquiler
    pub fn new() -> Self {
        let inspections = Arc::new(MemoryInspectionStore::new());
        let detections = Arc::new(MemoryDetectionStore::new());
        let fleet = Arc::new(MemoryFleetDirectory::new());
        let files = Arc::new(MemoryFileStore::new());

        let (tenant_id, user_id, vehicle_id, reservation_id) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        fleet.add_rental(tenant_id, vehicle_id, reservation_id).unwrap();

        let (state, events) = assemble(
            EnvironmentConfig::in_memory("./uploads"),
            Stores {
                inspections: inspections.clone(),
                detections: detections.clone(),
                fleet: fleet.clone(),
                files: files.clone(),
            },
        );

        Self {
            state,
            events,
            inspections,
            detections,
            fleet,
            files,
            tenant_id,
            user_id,
            vehicle_id,
            reservation_id,
        }
    }
}

pub fn photo_url(prefix: &str, slot: i16) -> String {
    format!("/uploads/inspections/{}-{}.jpg", prefix, slot)
}

pub fn full_photo_set(prefix: &str) -> Vec<PhotoInput> {
    (1..=8).map(|slot| PhotoInput::new(slot, photo_url(prefix, slot))).collect()
}

pub fn completion(odometer_km: i64, fuel_level: &str, prefix: &str) -> CompleteInspectionRequest {
    CompleteInspectionRequest {
        odometer_km,
        fuel_level: fuel_level.to_string(),
        photos: full_photo_set(prefix),
        acknowledged_warnings: Vec::new(),
    }
}

/// Panel con textura suave, como la chapa de un coche
pub fn panel(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(100 + x % 7) as u8, (120 + y % 5) as u8, 130])
    })
}

pub fn dented_panel(width: u32, height: u32) -> RgbImage {
    let mut image = panel(width, height);
    let block = RgbImage::from_pixel(40, 30, Rgb([5, 5, 5]));
    image.copy_from(&block, 50, 60).unwrap();
    image
}

pub fn png(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
