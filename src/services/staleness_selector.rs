use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repositories::{VehicleFilter, VehicleStore};
use crate::utils::errors::AppResult;

/// Candidato a refresco: identidad y matrícula bastan para volver a agregar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleVehicle {
    pub id: Uuid,
    pub registration_number: String,
}

/// Vehículos cuyo `last_fetched_at` es estrictamente anterior a `cutoff`
pub async fn find_stale(store: &dyn VehicleStore, cutoff: DateTime<Utc>) -> AppResult<Vec<StaleVehicle>> {
    let records = store.find(&VehicleFilter::fetched_before(cutoff)).await?;

    Ok(records
        .into_iter()
        .map(|record| StaleVehicle {
            id: record.id,
            registration_number: record.details.registration_number,
        })
        .collect())
}
