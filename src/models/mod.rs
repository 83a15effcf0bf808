//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean
//! al schema PostgreSQL de inspecciones y detecciones.

pub mod damage_detection;
pub mod inspection;
pub mod reservation;
pub mod warning;

pub use damage_detection::*;
pub use inspection::*;
pub use reservation::*;
pub use warning::*;
