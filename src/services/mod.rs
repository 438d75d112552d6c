//! Services module
//!
//! Lógica de negocio: agregación de los datos de un vehículo, selección de
//! vehículos desactualizados y su refresco periódico.

pub mod refresh_scheduler;
pub mod staleness_selector;
pub mod vehicle_details_service;

pub use refresh_scheduler::{RefreshConfig, RefreshScheduler, TickReport};
pub use staleness_selector::{find_stale, StaleVehicle};
pub use vehicle_details_service::VehicleDetailsService;
