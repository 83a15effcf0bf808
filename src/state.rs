//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::{DamageDetectionService, InspectionWorkflow};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub inspections: Arc<InspectionWorkflow>,
    pub detections: Arc<DamageDetectionService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        inspections: Arc<InspectionWorkflow>,
        detections: Arc<DamageDetectionService>,
    ) -> Self {
        Self {
            config,
            inspections,
            detections,
        }
    }
}
