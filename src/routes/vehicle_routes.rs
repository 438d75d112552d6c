use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::VehicleController;
use crate::dto::{ApiResponse, CreateVehicleRequest, VehicleResponse, VehicleSummaryResponse};
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle).get(list_vehicles))
        .route("/:registration", get(get_vehicle).delete(delete_vehicle))
        .route("/:registration/refresh", post(refresh_vehicle))
}

fn controller(state: &AppState) -> VehicleController {
    VehicleController::new(state.store.clone(), state.vehicle_details.clone())
}

async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleResponse>>), AppError> {
    let response = controller(&state).create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<VehicleSummaryResponse>>>, AppError> {
    let vehicles = controller(&state).list(user.user_id).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(registration): Path<String>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let vehicle = controller(&state).get(user.user_id, &registration).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(registration): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    controller(&state).delete(user.user_id, &registration).await?;
    Ok(Json(ApiResponse::message("Vehículo eliminado exitosamente".to_string())))
}

async fn refresh_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(registration): Path<String>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let response = controller(&state).refresh(user.user_id, &registration).await?;
    Ok(Json(response))
}
