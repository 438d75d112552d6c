//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! JWT, parseo de fechas de proveedores y la fuente de tiempo.

pub mod clock;
pub mod dates;
pub mod errors;
pub mod jwt;
pub mod validation;
