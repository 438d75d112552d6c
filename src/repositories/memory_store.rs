//! Implementación en memoria del gateway de persistencia
//!
//! Misma semántica que `PgVehicleStore` (orden de inserción, filtro estricto
//! sobre `last_fetched_at`, matrícula única por propietario); sustituye a
//! PostgreSQL en los tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::vehicle_repository::{VehicleFilter, VehicleStore};
use crate::models::{VehicleDetails, VehicleRecord};
use crate::utils::errors::{conflict_error, not_found_error, AppResult};

#[derive(Default)]
pub struct InMemoryVehicleStore {
    vehicles: RwLock<Vec<VehicleRecord>>,
}

impl InMemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cargar registros ya construidos (ids y marcas de tiempo incluidos)
    pub async fn seed(&self, records: impl IntoIterator<Item = VehicleRecord>) {
        self.vehicles.write().await.extend(records);
    }

    pub async fn len(&self) -> usize {
        self.vehicles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vehicles.read().await.is_empty()
    }
}

/// Equivalente a `UNIQUE(user_id, registration_number)`; `skip` excluye el propio registro
fn ensure_unique(
    vehicles: &[VehicleRecord],
    user_id: Uuid,
    registration_number: &str,
    skip: Option<Uuid>,
) -> AppResult<()> {
    let taken = vehicles.iter().any(|vehicle| {
        Some(vehicle.id) != skip
            && vehicle.user_id == user_id
            && vehicle.details.registration_number == registration_number
    });

    if taken {
        return Err(conflict_error("Vehicle", "registration number", registration_number));
    }
    Ok(())
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn insert(&self, user_id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord> {
        let mut vehicles = self.vehicles.write().await;
        ensure_unique(&vehicles, user_id, &details.registration_number, None)?;

        let now = Utc::now();
        let record = VehicleRecord {
            id: Uuid::new_v4(),
            user_id,
            details,
            created_at: now,
            updated_at: now,
        };

        vehicles.push(record.clone());
        Ok(record)
    }

    async fn replace(&self, id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord> {
        let mut vehicles = self.vehicles.write().await;
        let owner = vehicles
            .iter()
            .find(|vehicle| vehicle.id == id)
            .map(|vehicle| vehicle.user_id)
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;
        ensure_unique(&vehicles, owner, &details.registration_number, Some(id))?;

        let existing = vehicles
            .iter_mut()
            .find(|vehicle| vehicle.id == id)
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        existing.details = details;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn find(&self, filter: &VehicleFilter) -> AppResult<Vec<VehicleRecord>> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .iter()
            .filter(|vehicle| filter.matches(vehicle))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleRecord>> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.iter().find(|vehicle| vehicle.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut vehicles = self.vehicles.write().await;
        let before = vehicles.len();
        vehicles.retain(|vehicle| vehicle.id != id);
        Ok(vehicles.len() < before)
    }
}
