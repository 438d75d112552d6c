//! Shared application state
//!
//! Estado compartido que se pasa a través del router de Axum. El mismo
//! gateway de persistencia lo usa también el refresco en segundo plano.

use std::sync::Arc;

use crate::repositories::VehicleStore;
use crate::services::VehicleDetailsService;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VehicleStore>,
    pub vehicle_details: Arc<VehicleDetailsService>,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn VehicleStore>, vehicle_details: Arc<VehicleDetailsService>, jwt: JwtConfig) -> Self {
        Self {
            store,
            vehicle_details,
            jwt,
        }
    }
}
