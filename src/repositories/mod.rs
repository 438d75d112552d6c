pub mod memory_store;
pub mod vehicle_repository;

pub use memory_store::InMemoryVehicleStore;
pub use vehicle_repository::{PgVehicleStore, VehicleFilter, VehicleStore};
