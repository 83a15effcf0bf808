//! Services module
//!
//! Este módulo contiene la lógica de negocio: el flujo de inspección,
//! las reglas de advertencias y el motor de detección de daños.

pub mod completion_events;
pub mod damage_detection;
pub mod detection_service;
pub mod file_store;
pub mod inspection_workflow;
pub mod photo_slots;
pub mod warning_engine;

pub use completion_events::{EventPublisher, InspectionEvent, PerformanceScorer};
pub use damage_detection::DamageDetectionEngine;
pub use detection_service::DamageDetectionService;
pub use file_store::{FileStore, LocalFileStore, MemoryFileStore};
pub use inspection_workflow::InspectionWorkflow;
