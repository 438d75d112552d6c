use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, CreateVehicleRequest, VehicleResponse, VehicleSummaryResponse};
use crate::models::VehicleRecord;
use crate::repositories::{VehicleFilter, VehicleStore};
use crate::services::VehicleDetailsService;
use crate::utils::errors::{conflict_error, not_found_error, validation_error, AppResult};
use crate::utils::validation::{normalize_registration_number, validate_registration_number};

pub struct VehicleController {
    store: Arc<dyn VehicleStore>,
    details: Arc<VehicleDetailsService>,
}

impl VehicleController {
    pub fn new(store: Arc<dyn VehicleStore>, details: Arc<VehicleDetailsService>) -> Self {
        Self { store, details }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateVehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;
        let registration_number = parse_registration_number(&request.registration_number)?;

        // Verificar que la matrícula no exista para este usuario
        let existing = self
            .store
            .find(&VehicleFilter::owned_by(user_id).with_registration(registration_number.clone()))
            .await?;
        if !existing.is_empty() {
            return Err(conflict_error("Vehicle", "registration number", &registration_number));
        }

        let details = self.details.fetch(&registration_number).await?;
        let vehicle = self.store.insert(user_id, details).await?;
        info!("🚗 Vehículo {} registrado para {}", vehicle.registration_number(), user_id);

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<VehicleSummaryResponse>> {
        let vehicles = self.store.find(&VehicleFilter::owned_by(user_id)).await?;
        Ok(vehicles.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, user_id: Uuid, registration_number: &str) -> AppResult<VehicleResponse> {
        Ok(self.find_owned(user_id, registration_number).await?.into())
    }

    pub async fn delete(&self, user_id: Uuid, registration_number: &str) -> AppResult<()> {
        let vehicle = self.find_owned(user_id, registration_number).await?;
        if !self.store.delete(vehicle.id).await? {
            return Err(not_found_error("Vehicle", vehicle.registration_number()));
        }
        info!("🗑️ Vehículo {} eliminado", vehicle.registration_number());
        Ok(())
    }

    /// Volver a agregar un vehículo inmediatamente, sin esperar al refresco periódico
    pub async fn refresh(
        &self,
        user_id: Uuid,
        registration_number: &str,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        let vehicle = self.find_owned(user_id, registration_number).await?;
        let details = self.details.fetch(vehicle.registration_number()).await?;
        let refreshed = self.store.replace(vehicle.id, details).await?;

        Ok(ApiResponse::success_with_message(
            refreshed.into(),
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    async fn find_owned(&self, user_id: Uuid, registration_number: &str) -> AppResult<VehicleRecord> {
        let registration_number = normalize_registration_number(registration_number);
        self.store
            .find(&VehicleFilter::owned_by(user_id).with_registration(registration_number.clone()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found_error("Vehicle", &registration_number))
    }
}

fn parse_registration_number(value: &str) -> AppResult<String> {
    let registration_number = normalize_registration_number(value);
    validate_registration_number(&registration_number)
        .map_err(|_| validation_error("registration_number", "Registration Number must be valid"))?;
    Ok(registration_number)
}
