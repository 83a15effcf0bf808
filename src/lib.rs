//! Inspecciones de recogida/devolución de vehículos de alquiler y
//! detección de daños por comparación de fotos.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::Receiver;

use config::{EnvironmentConfig, StorageBackend};
use repositories::{
    DetectionStore, FleetDirectory, InspectionStore, MemoryDetectionStore, MemoryFleetDirectory,
    MemoryInspectionStore, PgDetectionRepository, PgFleetDirectory, PgInspectionRepository,
};
use services::completion_events::EVENT_QUEUE_CAPACITY;
use services::{
    DamageDetectionEngine, DamageDetectionService, EventPublisher, FileStore, InspectionEvent,
    InspectionWorkflow, LocalFileStore,
};
use state::AppState;

/// Cliente HTTP compartido (fotos remotas y servicio de puntuación)
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Colaboradores de almacenamiento del servicio
pub struct Stores {
    pub inspections: Arc<dyn InspectionStore>,
    pub detections: Arc<dyn DetectionStore>,
    pub fleet: Arc<dyn FleetDirectory>,
    pub files: Arc<dyn FileStore>,
}

/// Ensambla servicios y estado sobre unos stores dados
pub fn assemble(
    config: EnvironmentConfig,
    stores: Stores,
) -> (AppState, Receiver<InspectionEvent>) {
    let (events, rx) = EventPublisher::channel(EVENT_QUEUE_CAPACITY);
    let workflow = Arc::new(InspectionWorkflow::new(
        stores.inspections,
        stores.fleet.clone(),
        events,
    ));
    let detections = Arc::new(DamageDetectionService::new(
        stores.detections,
        stores.fleet,
        workflow.clone(),
        stores.files,
        DamageDetectionEngine::default(),
    ));

    (AppState::new(config, workflow, detections), rx)
}

/// Construye los stores según `STORAGE_BACKEND`
pub async fn build_stores(
    config: &EnvironmentConfig,
    http: reqwest::Client,
) -> anyhow::Result<Stores> {
    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
        config.uploads_dir.clone(),
        config.uploads_public_prefix.clone(),
        http,
    ));

    let stores = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = database::create_pool(url).await?;
            database::run_migrations(&pool).await?;

            Stores {
                inspections: Arc::new(PgInspectionRepository::new(pool.clone())),
                detections: Arc::new(PgDetectionRepository::new(pool.clone())),
                fleet: Arc::new(PgFleetDirectory::new(pool)),
                files,
            }
        }
        StorageBackend::Memory => Stores {
            inspections: Arc::new(MemoryInspectionStore::new()),
            detections: Arc::new(MemoryDetectionStore::new()),
            fleet: Arc::new(MemoryFleetDirectory::new()),
            files,
        },
    };

    Ok(stores)
}
