//! Cliente HTTP para el Vehicle Enquiry Service (DVLA)
//!
//! `POST /vehicle-enquiry/v1/vehicles` con `{"registrationNumber": ...}`
//! y la clave en `x-api-key`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{ensure_success, ProviderError, VehicleStatusProvider};

pub const DEFAULT_VES_API_URL: &str = "https://driver-vehicle-licensing.api.gov.uk";

const VEHICLES_PATH: &str = "/vehicle-enquiry/v1/vehicles";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VehicleStatusRequest<'a> {
    registration_number: &'a str,
}

/// Estado de un vehículo según el VES
///
/// Las fechas se mantienen como texto (`2024-05-01`); el agregador las parsea.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleStatus {
    pub registration_number: String,
    pub tax_status: Option<String>,
    pub tax_due_date: Option<String>,
    pub art_end_date: Option<String>,
    pub mot_status: Option<String>,
    pub mot_expiry_date: Option<String>,
    pub make: Option<String>,
    pub colour: Option<String>,
    pub fuel_type: Option<String>,
    pub engine_capacity: Option<i32>,
    pub co2_emissions: Option<i32>,
    pub year_of_manufacture: Option<i32>,
    pub month_of_first_registration: Option<String>,
    pub marked_for_export: Option<bool>,
    pub type_approval: Option<String>,
    pub wheelplan: Option<String>,
    pub revenue_weight: Option<i32>,
    pub euro_status: Option<String>,
    pub real_driving_emissions: Option<String>,
    #[serde(rename = "dateOfLastV5CIssued")]
    pub date_of_last_v5c_issued: Option<String>,
}

/// Cliente HTTP del VES
pub struct VesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VesClient {
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
impl VehicleStatusProvider for VesClient {
    async fn get_vehicle_status(&self, registration_number: &str) -> Result<VehicleStatus, ProviderError> {
        let url = format!("{}{}", self.base_url, VEHICLES_PATH);
        debug!("🌐 VES: consultando estado de {}", registration_number);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&VehicleStatusRequest { registration_number })
            .send()
            .await?;

        let response = ensure_success(response).await.map_err(|e| {
            error!("❌ VES respondió con error para {}: {}", registration_number, e);
            e
        })?;

        Ok(response.json::<VehicleStatus>().await?)
    }
}
