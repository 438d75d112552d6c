//! Clients - HTTP Clients for External APIs
//!
//! Clientes de los dos proveedores gubernamentales: el servicio de estado
//! (DVLA Vehicle Enquiry Service) y el historial MOT. Ambos son
//! petición/respuesta sin estado y se exponen detrás de traits para poder
//! sustituirlos en tests.

pub mod mot_history_client;
pub mod ves_client;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub use mot_history_client::{MotHistoryClient, MotHistoryVehicle, RawMotTest, RfrAndComment};
pub use ves_client::{VehicleStatus, VesClient};

/// Errores de transporte o respuesta de un proveedor
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Provider returned no vehicle")]
    EmptyResponse,
}

/// Proveedor del estado actual de impuestos/matriculación
#[async_trait]
pub trait VehicleStatusProvider: Send + Sync {
    async fn get_vehicle_status(&self, registration_number: &str) -> Result<VehicleStatus, ProviderError>;
}

/// Proveedor del historial de pruebas MOT
///
/// La respuesta es una lista de vehículos; quien la consume decide cuál usar.
#[async_trait]
pub trait MotHistoryProvider: Send + Sync {
    async fn get_vehicle_history(&self, registration_number: &str) -> Result<Vec<MotHistoryVehicle>, ProviderError>;
}

/// Convertir una respuesta no exitosa en `ProviderError::UnexpectedStatus`
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::UnexpectedStatus { status, body })
}
