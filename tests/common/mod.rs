#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use vehicle_tracker::clients::{
    MotHistoryProvider, MotHistoryVehicle, ProviderError, RawMotTest, VehicleStatus, VehicleStatusProvider,
};
use vehicle_tracker::models::{VehicleDetails, VehicleRecord};
use vehicle_tracker::services::VehicleDetailsService;
use vehicle_tracker::utils::clock::FixedClock;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 2, 10, 30, 0).unwrap()
}

/// Proveedores falsos con respuestas por matrícula
///
/// Matrículas desconocidas responden 404; las marcadas con `fail` responden 500
/// en el servicio de estado y las marcadas con `fail_history` en el historial MOT.
#[derive(Default)]
pub struct FakeProviders {
    vehicles: Mutex<HashMap<String, (VehicleStatus, MotHistoryVehicle)>>,
    failing: Mutex<HashSet<String>>,
    failing_history: Mutex<HashSet<String>>,
    status_calls: Mutex<Vec<String>>,
}

impl FakeProviders {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_vehicle(&self, registration: &str, status: VehicleStatus, history: MotHistoryVehicle) {
        self.vehicles
            .lock()
            .unwrap()
            .insert(registration.to_string(), (status, history));
    }

    /// Vehículo con una única prueba aprobada
    pub fn with_passed_vehicle(&self, registration: &str, make: &str) {
        let mut history = sample_history(
            registration,
            vec![raw_test("PASSED", "2023.11.21 09:12:00", Some("2024.11.20"), "123")],
        );
        history.make = Some(make.to_string());
        self.set_vehicle(registration, sample_status(registration, Some("2024-05-01")), history);
    }

    pub fn fail(&self, registration: &str) {
        self.failing.lock().unwrap().insert(registration.to_string());
    }

    pub fn recover(&self, registration: &str) {
        self.failing.lock().unwrap().remove(registration);
    }

    pub fn fail_history(&self, registration: &str) {
        self.failing_history.lock().unwrap().insert(registration.to_string());
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }

    fn not_found() -> ProviderError {
        ProviderError::UnexpectedStatus {
            status: StatusCode::NOT_FOUND,
            body: "{\"errors\":[{\"status\":\"404\",\"title\":\"Vehicle Not Found\"}]}".to_string(),
        }
    }
}

#[async_trait]
impl VehicleStatusProvider for FakeProviders {
    async fn get_vehicle_status(&self, registration_number: &str) -> Result<VehicleStatus, ProviderError> {
        self.status_calls
            .lock()
            .unwrap()
            .push(registration_number.to_string());

        if self.failing.lock().unwrap().contains(registration_number) {
            return Err(ProviderError::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "upstream unavailable".to_string(),
            });
        }

        self.vehicles
            .lock()
            .unwrap()
            .get(registration_number)
            .map(|(status, _)| status.clone())
            .ok_or_else(Self::not_found)
    }
}

#[async_trait]
impl MotHistoryProvider for FakeProviders {
    async fn get_vehicle_history(&self, registration_number: &str) -> Result<Vec<MotHistoryVehicle>, ProviderError> {
        if self.failing_history.lock().unwrap().contains(registration_number) {
            return Err(ProviderError::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "history unavailable".to_string(),
            });
        }

        self.vehicles
            .lock()
            .unwrap()
            .get(registration_number)
            .map(|(_, history)| vec![history.clone()])
            .ok_or_else(Self::not_found)
    }
}

pub fn details_service(providers: &Arc<FakeProviders>, clock: &Arc<FixedClock>) -> Arc<VehicleDetailsService> {
    Arc::new(VehicleDetailsService::new(
        providers.clone(),
        providers.clone(),
        clock.clone(),
    ))
}

pub fn sample_status(registration: &str, tax_due_date: Option<&str>) -> VehicleStatus {
    VehicleStatus {
        registration_number: registration.to_string(),
        tax_status: Some("Taxed".to_string()),
        tax_due_date: tax_due_date.map(str::to_string),
        make: Some("MAZDA".to_string()),
        ..VehicleStatus::default()
    }
}

pub fn sample_history(registration: &str, tests: Vec<RawMotTest>) -> MotHistoryVehicle {
    MotHistoryVehicle {
        registration: registration.to_string(),
        make: Some("MAZDA".to_string()),
        model: Some("MPV".to_string()),
        mot_tests: tests,
        ..MotHistoryVehicle::default()
    }
}

pub fn raw_test(result: &str, completed: &str, expiry: Option<&str>, number: &str) -> RawMotTest {
    RawMotTest {
        completed_date: Some(completed.to_string()),
        test_result: Some(result.to_string()),
        expiry_date: expiry.map(str::to_string),
        odometer_value: Some("200413".to_string()),
        odometer_unit: Some("mi".to_string()),
        mot_test_number: Some(number.to_string()),
        ..RawMotTest::default()
    }
}

pub fn stored_record(user_id: Uuid, registration: &str, last_fetched_at: DateTime<Utc>) -> VehicleRecord {
    VehicleRecord {
        id: Uuid::new_v4(),
        user_id,
        details: VehicleDetails {
            registration_number: registration.to_string(),
            manufacturer: "OLD MAKE".to_string(),
            model: "OLD MODEL".to_string(),
            mot_due: None,
            ved_due: None,
            mot_history: Vec::new(),
            last_fetched_at,
        },
        created_at: last_fetched_at,
        updated_at: last_fetched_at,
    }
}
