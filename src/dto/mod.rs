//! DTOs de la API
//!
//! Requests y envoltorios de respuesta de los endpoints de inspección
//! y de detección de daños.

pub mod api_response;
pub mod damage_detection_dto;
pub mod inspection_dto;

pub use api_response::ApiResponse;
pub use damage_detection_dto::*;
pub use inspection_dto::*;
