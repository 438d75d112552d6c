use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{MotTest, VehicleRecord};

// Request para dar de alta un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 16, message = "Registration Number is required"))]
    pub registration_number: String,
}

// Response de vehículo con el historial completo
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub registration_number: String,
    pub manufacturer: String,
    pub model: String,
    pub mot_due: Option<DateTime<Utc>>,
    pub ved_due: Option<DateTime<Utc>>,
    pub mot_history: Vec<MotTest>,
    pub last_fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleRecord> for VehicleResponse {
    fn from(record: VehicleRecord) -> Self {
        Self {
            id: record.id,
            registration_number: record.details.registration_number,
            manufacturer: record.details.manufacturer,
            model: record.details.model,
            mot_due: record.details.mot_due,
            ved_due: record.details.ved_due,
            mot_history: record.details.mot_history,
            last_fetched_at: record.details.last_fetched_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// Response resumida para listados (sin historial)
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleSummaryResponse {
    pub id: Uuid,
    pub registration_number: String,
    pub manufacturer: String,
    pub model: String,
    pub mot_due: Option<DateTime<Utc>>,
    pub ved_due: Option<DateTime<Utc>>,
    /// Resultado de la prueba más reciente, si existe
    pub last_test_passed: Option<bool>,
    pub last_fetched_at: DateTime<Utc>,
}

impl From<VehicleRecord> for VehicleSummaryResponse {
    fn from(record: VehicleRecord) -> Self {
        let last_test_passed = record.details.mot_history.first().map(|test| test.passed);
        Self {
            id: record.id,
            registration_number: record.details.registration_number,
            manufacturer: record.details.manufacturer,
            model: record.details.model,
            mot_due: record.details.mot_due,
            ved_due: record.details.ved_due,
            last_test_passed,
            last_fetched_at: record.details.last_fetched_at,
        }
    }
}
