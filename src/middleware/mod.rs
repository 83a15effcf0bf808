//! Middleware del sistema
//!
//! Este módulo contiene el extractor de contexto de tenant y la
//! configuración de CORS.

pub mod cors;
pub mod tenant;

pub use cors::cors_middleware;
pub use tenant::TenantContext;
