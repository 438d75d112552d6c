//! Modelo de Vehicle
//!
//! `VehicleDetails` es el resultado de una agregación (estado + historial MOT)
//! sin identidad; `VehicleRecord` es lo que se persiste: los mismos datos más
//! id, propietario y marcas de ciclo de vida.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resultado textual del proveedor para una ITV aprobada
pub const PASSED_RESULT: &str = "PASSED";

/// Comentario o motivo de rechazo de una prueba MOT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestComment {
    pub text: String,
    /// Etiqueta del proveedor (MINOR, MAJOR, DANGEROUS, ADVISORY...), sin validar
    pub category: String,
}

/// Una prueba MOT histórica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotTest {
    pub test_number: i64,
    pub passed: bool,
    /// `None` si el proveedor no la envía
    pub completed_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// "<valor> <unidad>", p.ej. "200413 mi"
    pub odometer_reading: String,
    pub comments: Vec<TestComment>,
}

/// Datos agregados de un vehículo, listos para insertar o reemplazar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub registration_number: String,
    pub manufacturer: String,
    pub model: String,
    /// Caducidad de la prueba más reciente; `None` si no la tiene (p.ej. rechazada)
    pub mot_due: Option<DateTime<Utc>>,
    pub ved_due: Option<DateTime<Utc>>,
    /// Más reciente primero, en el orden del proveedor
    pub mot_history: Vec<MotTest>,
    pub last_fetched_at: DateTime<Utc>,
}

/// Vehicle persistido
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VehicleRecord {
    pub fn registration_number(&self) -> &str {
        &self.details.registration_number
    }

    pub fn last_fetched_at(&self) -> DateTime<Utc> {
        self.details.last_fetched_at
    }
}
