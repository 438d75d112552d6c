//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos canónicos de vehículos.

pub mod vehicle;

pub use vehicle::{MotTest, TestComment, VehicleDetails, VehicleRecord, PASSED_RESULT};
