//! Cliente HTTP para la API de historial MOT
//!
//! `GET /trade/vehicles/mot-tests?registration=...` con `Accept:
//! application/json+v6`. Los campos numéricos (número de prueba,
//! odómetro, cilindrada) llegan como texto y se dejan así en este nivel.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{ensure_success, MotHistoryProvider, ProviderError};

pub const DEFAULT_MOT_HISTORY_API_URL: &str = "https://beta.check-mot.service.gov.uk";

const MOT_TESTS_PATH: &str = "/trade/vehicles/mot-tests";
const MOT_HISTORY_ACCEPT: &str = "application/json+v6";

/// Vehículo con su historial MOT
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotHistoryVehicle {
    pub registration: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub first_used_date: Option<String>,
    pub fuel_type: Option<String>,
    pub primary_colour: Option<String>,
    pub vehicle_id: Option<String>,
    pub registration_date: Option<String>,
    pub manufacture_date: Option<String>,
    pub engine_size: Option<String>,
    pub mot_tests: Vec<RawMotTest>,
}

/// Prueba MOT tal y como la envía el proveedor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMotTest {
    pub completed_date: Option<String>,
    pub test_result: Option<String>,
    pub expiry_date: Option<String>,
    pub odometer_value: Option<String>,
    pub odometer_unit: Option<String>,
    pub mot_test_number: Option<String>,
    pub odometer_result_type: Option<String>,
    pub rfr_and_comments: Vec<RfrAndComment>,
}

/// Motivo de rechazo, advertencia o comentario de una prueba
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfrAndComment {
    pub text: String,
    #[serde(rename = "type")]
    pub comment_type: String,
    pub dangerous: bool,
}

/// Cliente HTTP del historial MOT
pub struct MotHistoryClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MotHistoryClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MotHistoryProvider for MotHistoryClient {
    async fn get_vehicle_history(&self, registration_number: &str) -> Result<Vec<MotHistoryVehicle>, ProviderError> {
        let url = format!("{}{}", self.base_url, MOT_TESTS_PATH);
        debug!("🌐 MOT History: consultando historial de {}", registration_number);

        let response = self
            .client
            .get(&url)
            .query(&[("registration", registration_number)])
            .header(ACCEPT, MOT_HISTORY_ACCEPT)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let response = ensure_success(response).await.map_err(|e| {
            error!("❌ MOT History respondió con error para {}: {}", registration_number, e);
            e
        })?;

        Ok(response.json::<Vec<MotHistoryVehicle>>().await?)
    }
}
