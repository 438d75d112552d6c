//! Agregación de datos de vehículos
//!
//! Combina una respuesta del servicio de estado (VES) y una del historial MOT
//! en un `VehicleDetails` completo. No persiste nada: el llamador decide si
//! inserta (alta por el propietario) o reemplaza (refresco).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{
    MotHistoryProvider, MotHistoryVehicle, ProviderError, RawMotTest, VehicleStatus, VehicleStatusProvider,
};
use crate::models::{MotTest, TestComment, VehicleDetails, PASSED_RESULT};
use crate::utils::clock::Clock;
use crate::utils::dates::{
    parse_date_only_with_fallback, parse_date_time, MOT_DATE_FALLBACK_FORMATS, MOT_DATE_FORMAT,
    MOT_DATE_TIME_FORMAT, VES_DATE_FORMAT,
};
use crate::utils::errors::AggregationError;

pub struct VehicleDetailsService {
    status_provider: Arc<dyn VehicleStatusProvider>,
    history_provider: Arc<dyn MotHistoryProvider>,
    clock: Arc<dyn Clock>,
}

impl VehicleDetailsService {
    pub fn new(
        status_provider: Arc<dyn VehicleStatusProvider>,
        history_provider: Arc<dyn MotHistoryProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_provider,
            history_provider,
            clock,
        }
    }

    /// Consultar ambos proveedores y construir el vehículo completo
    ///
    /// Cualquier fallo de un proveedor aborta la agregación sin resultado parcial.
    /// `last_fetched_at` queda fijado al instante de inicio.
    pub async fn fetch(&self, registration_number: &str) -> Result<VehicleDetails, AggregationError> {
        let fetched_at = self.clock.now();
        info!("🚗 Agregando datos del vehículo {}", registration_number);

        let status = self
            .status_provider
            .get_vehicle_status(registration_number)
            .await
            .map_err(AggregationError::StatusFetch)?;

        let vehicles = self
            .history_provider
            .get_vehicle_history(registration_number)
            .await
            .map_err(AggregationError::HistoryFetch)?;
        let history = select_history(registration_number, vehicles)?;

        let details = normalize(registration_number, status, history, fetched_at)?;
        info!(
            "✅ Vehículo {} agregado: {} pruebas MOT",
            details.registration_number,
            details.mot_history.len()
        );
        Ok(details)
    }
}

/// Elegir el primer vehículo de la respuesta del historial
fn select_history(
    registration_number: &str,
    vehicles: Vec<MotHistoryVehicle>,
) -> Result<MotHistoryVehicle, AggregationError> {
    if vehicles.len() > 1 {
        warn!(
            "⚠️ El historial MOT devolvió {} vehículos para {}; se usa el primero",
            vehicles.len(),
            registration_number
        );
    }

    vehicles
        .into_iter()
        .next()
        .ok_or(AggregationError::HistoryFetch(ProviderError::EmptyResponse))
}

/// Combinar las dos respuestas en un `VehicleDetails`
///
/// Los campos opcionales ausentes quedan en `None`/vacío/0; los presentes pero
/// mal formados (fechas, números) producen `AggregationError::InvalidField`.
pub fn normalize(
    requested_registration: &str,
    status: VehicleStatus,
    history: MotHistoryVehicle,
    fetched_at: DateTime<Utc>,
) -> Result<VehicleDetails, AggregationError> {
    if history.mot_tests.is_empty() {
        return Err(AggregationError::NoHistoryAvailable {
            registration_number: requested_registration.to_string(),
        });
    }

    let mot_history = history
        .mot_tests
        .into_iter()
        .map(normalize_test)
        .collect::<Result<Vec<_>, _>>()?;

    let mot_due = mot_history.first().and_then(|test| test.expiry_date);
    let ved_due = parse_optional_date(status.tax_due_date.as_deref(), "taxDueDate", VES_DATE_FORMAT, &[])?;

    // El VES devuelve la matrícula normalizada; sólo se usa la pedida si viene vacía
    let registration_number = if status.registration_number.trim().is_empty() {
        requested_registration.to_string()
    } else {
        status.registration_number
    };

    Ok(VehicleDetails {
        registration_number,
        manufacturer: history.make.unwrap_or_default(),
        model: history.model.unwrap_or_default(),
        mot_due,
        ved_due,
        mot_history,
        last_fetched_at: fetched_at,
    })
}

/// `true` sólo si el resultado es exactamente "PASSED"
pub fn is_passed(test_result: Option<&str>) -> bool {
    test_result == Some(PASSED_RESULT)
}

fn normalize_test(raw: RawMotTest) -> Result<MotTest, AggregationError> {
    let completed_date = non_empty(raw.completed_date.as_deref())
        .map(|value| {
            parse_date_time(value, MOT_DATE_TIME_FORMAT).map_err(|e| invalid_field("completedDate", value, e))
        })
        .transpose()?;

    let expiry_date = parse_optional_date(
        raw.expiry_date.as_deref(),
        "expiryDate",
        MOT_DATE_FORMAT,
        MOT_DATE_FALLBACK_FORMATS,
    )?;
    let test_number = parse_number(raw.mot_test_number.as_deref(), "motTestNumber")?;
    let odometer_value = parse_number(raw.odometer_value.as_deref(), "odometerValue")?;

    let comments = raw
        .rfr_and_comments
        .into_iter()
        .map(|comment| TestComment {
            text: comment.text,
            category: comment.comment_type,
        })
        .collect();

    Ok(MotTest {
        test_number,
        passed: is_passed(raw.test_result.as_deref()),
        completed_date,
        expiry_date,
        odometer_reading: odometer_reading(odometer_value, raw.odometer_unit.as_deref()),
        comments,
    })
}

fn odometer_reading(value: i64, unit: Option<&str>) -> String {
    match non_empty(unit) {
        Some(unit) => format!("{} {}", value, unit),
        None => value.to_string(),
    }
}

fn parse_optional_date(
    value: Option<&str>,
    field: &'static str,
    pattern: &str,
    fallbacks: &[&str],
) -> Result<Option<DateTime<Utc>>, AggregationError> {
    non_empty(value)
        .map(|raw| {
            parse_date_only_with_fallback(raw, pattern, fallbacks).map_err(|e| invalid_field(field, raw, e))
        })
        .transpose()
}

fn parse_number(value: Option<&str>, field: &'static str) -> Result<i64, AggregationError> {
    match non_empty(value) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid_field(field, raw, e)),
        None => Ok(0),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_field(field: &'static str, value: &str, reason: impl std::fmt::Display) -> AggregationError {
    AggregationError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::RfrAndComment;
    use crate::utils::clock::FixedClock;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 10, 30, 0).unwrap()
    }

    fn status(registration: &str, tax_due_date: Option<&str>) -> VehicleStatus {
        VehicleStatus {
            registration_number: registration.to_string(),
            tax_status: Some("Taxed".to_string()),
            tax_due_date: tax_due_date.map(str::to_string),
            make: Some("MAZDA".to_string()),
            ..VehicleStatus::default()
        }
    }

    fn raw_test(result: &str, completed: &str, expiry: Option<&str>, number: &str) -> RawMotTest {
        RawMotTest {
            completed_date: Some(completed.to_string()),
            test_result: Some(result.to_string()),
            expiry_date: expiry.map(str::to_string),
            odometer_value: Some("200413".to_string()),
            odometer_unit: Some("mi".to_string()),
            mot_test_number: Some(number.to_string()),
            odometer_result_type: Some("READ".to_string()),
            rfr_and_comments: Vec::new(),
        }
    }

    fn history(tests: Vec<RawMotTest>) -> MotHistoryVehicle {
        MotHistoryVehicle {
            registration: "AB12CDE".to_string(),
            make: Some("MAZDA".to_string()),
            model: Some("MPV".to_string()),
            mot_tests: tests,
            ..MotHistoryVehicle::default()
        }
    }

    #[test]
    fn test_worked_example() {
        let details = normalize(
            "AB12CDE",
            status("AB12CDE", Some("2024-05-01")),
            history(vec![raw_test("PASSED", "2023.11.21 09:12:00", Some("2024.11.20"), "123")]),
            fetched_at(),
        )
        .unwrap();

        assert_eq!(details.registration_number, "AB12CDE");
        assert_eq!(details.ved_due, Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert_eq!(details.mot_due, Some(Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap()));
        assert!(details.mot_history[0].passed);
        assert_eq!(details.mot_history[0].test_number, 123);
        assert_eq!(details.manufacturer, "MAZDA");
        assert_eq!(details.model, "MPV");
        assert_eq!(details.last_fetched_at, fetched_at());
    }

    #[test]
    fn test_literal_provider_payloads_with_dashed_expiry() {
        let status = VehicleStatus {
            registration_number: "AB12CDE".to_string(),
            tax_due_date: Some("2024-05-01".to_string()),
            ..VehicleStatus::default()
        };
        let test = RawMotTest {
            test_result: Some("PASSED".to_string()),
            expiry_date: Some("2024-11-20".to_string()),
            mot_test_number: Some("123".to_string()),
            ..RawMotTest::default()
        };
        let vehicle = MotHistoryVehicle {
            mot_tests: vec![test],
            ..MotHistoryVehicle::default()
        };

        let details = normalize("AB12CDE", status, vehicle, fetched_at()).unwrap();

        assert_eq!(details.registration_number, "AB12CDE");
        assert_eq!(details.ved_due, Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert_eq!(details.mot_due, Some(Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap()));
        assert!(details.mot_history[0].passed);
        assert_eq!(details.mot_history[0].test_number, 123);
        assert_eq!(details.mot_history[0].completed_date, None);
    }

    #[test]
    fn test_mot_due_follows_most_recent_test_and_order_is_kept() {
        let details = normalize(
            "P239FWP",
            status("P239FWP", Some("2021-06-01")),
            history(vec![
                raw_test("PASSED", "2020.10.21 08:17:47", Some("2021.10.20"), "901662956826"),
                raw_test("FAILED", "2019.10.18 11:00:00", None, "501662956826"),
                raw_test("PASSED", "2018.10.17 14:45:10", Some("2019.10.16"), "301662956826"),
            ]),
            fetched_at(),
        )
        .unwrap();

        assert_eq!(details.mot_due, details.mot_history[0].expiry_date);
        let numbers: Vec<i64> = details.mot_history.iter().map(|t| t.test_number).collect();
        assert_eq!(numbers, vec![901662956826, 501662956826, 301662956826]);
        assert_eq!(
            details.mot_history[0].completed_date,
            Some(Utc.with_ymd_and_hms(2020, 10, 21, 8, 17, 47).unwrap())
        );
        assert_eq!(details.mot_history[0].odometer_reading, "200413 mi");
        assert!(details.mot_history[1].expiry_date.is_none());
    }

    #[test]
    fn test_failed_latest_test_without_expiry_leaves_mot_due_empty() {
        let details = normalize(
            "AB12CDE",
            status("AB12CDE", Some("2024-05-01")),
            history(vec![raw_test("FAILED", "2024.03.01 10:00:00", None, "77")]),
            fetched_at(),
        )
        .unwrap();

        assert!(details.mot_due.is_none());
        assert!(!details.mot_history[0].passed);
    }

    #[test]
    fn test_zero_tests_is_no_history_available() {
        let result = normalize(
            "AB12CDE",
            status("AB12CDE", Some("2024-05-01")),
            history(Vec::new()),
            fetched_at(),
        );

        assert!(matches!(
            result,
            Err(AggregationError::NoHistoryAvailable { registration_number }) if registration_number == "AB12CDE"
        ));
    }

    #[test]
    fn test_passed_requires_exact_match() {
        assert!(is_passed(Some("PASSED")));
        for other in ["PASS", "passed", "Passed", "FAILED", "failed", "", "PASSED "] {
            assert!(!is_passed(Some(other)), "{:?} should not count as passed", other);
        }
        assert!(!is_passed(None));
    }

    #[test]
    fn test_comments_are_mapped_in_order() {
        let mut test = raw_test("FAILED", "2024.03.01 10:00:00", None, "77");
        test.rfr_and_comments = vec![
            RfrAndComment {
                text: "Nearside Front Track rod end ball joint dust cover damaged".to_string(),
                comment_type: "MINOR".to_string(),
                dangerous: false,
            },
            RfrAndComment {
                text: "Offside Front Brake disc excessively worn".to_string(),
                comment_type: "DANGEROUS".to_string(),
                dangerous: true,
            },
            RfrAndComment {
                text: "Something the tester noticed".to_string(),
                comment_type: "SOMETHING_NEW".to_string(),
                dangerous: false,
            },
        ];

        let details = normalize("AB12CDE", status("AB12CDE", None), history(vec![test]), fetched_at()).unwrap();
        let categories: Vec<&str> = details.mot_history[0]
            .comments
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(categories, vec!["MINOR", "DANGEROUS", "SOMETHING_NEW"]);
        assert_eq!(
            details.mot_history[0].comments[1].text,
            "Offside Front Brake disc excessively worn"
        );
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let test = RawMotTest {
            completed_date: Some("2024.03.01 10:00:00".to_string()),
            ..RawMotTest::default()
        };
        let vehicle = MotHistoryVehicle {
            mot_tests: vec![test],
            ..MotHistoryVehicle::default()
        };

        let details = normalize("AB12CDE", VehicleStatus::default(), vehicle, fetched_at()).unwrap();

        assert_eq!(details.registration_number, "AB12CDE");
        assert!(details.ved_due.is_none());
        assert!(details.mot_due.is_none());
        assert_eq!(details.manufacturer, "");
        assert_eq!(details.model, "");
        assert_eq!(details.mot_history[0].test_number, 0);
        assert_eq!(details.mot_history[0].odometer_reading, "0");
        assert!(!details.mot_history[0].passed);
    }

    #[test]
    fn test_status_registration_is_authoritative() {
        let details = normalize(
            "ab12cde",
            status("AB12CDE", None),
            history(vec![raw_test("PASSED", "2023.11.21 09:12:00", Some("2024.11.20"), "1")]),
            fetched_at(),
        )
        .unwrap();
        assert_eq!(details.registration_number, "AB12CDE");
    }

    #[test]
    fn test_malformed_values_are_invalid_fields() {
        let cases = vec![
            (raw_test("PASSED", "2023-11-21T09:12:00Z", None, "1"), "completedDate"),
            (raw_test("PASSED", "2023.11.21 09:12:00", Some("20/11/2024"), "1"), "expiryDate"),
            (raw_test("PASSED", "2023.11.21 09:12:00", None, "12ab"), "motTestNumber"),
        ];

        for (test, expected_field) in cases {
            let result = normalize("AB12CDE", status("AB12CDE", None), history(vec![test]), fetched_at());
            match result {
                Err(AggregationError::InvalidField { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected InvalidField({}), got {:?}", expected_field, other),
            }
        }

        let result = normalize(
            "AB12CDE",
            status("AB12CDE", Some("01/05/2024")),
            history(vec![raw_test("PASSED", "2023.11.21 09:12:00", None, "1")]),
            fetched_at(),
        );
        assert!(matches!(result, Err(AggregationError::InvalidField { field: "taxDueDate", .. })));
    }

    struct FailingStatus;

    #[async_trait]
    impl VehicleStatusProvider for FailingStatus {
        async fn get_vehicle_status(&self, _registration_number: &str) -> Result<VehicleStatus, ProviderError> {
            Err(ProviderError::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            })
        }
    }

    struct OkStatus;

    #[async_trait]
    impl VehicleStatusProvider for OkStatus {
        async fn get_vehicle_status(&self, registration_number: &str) -> Result<VehicleStatus, ProviderError> {
            Ok(status(registration_number, Some("2024-05-01")))
        }
    }

    struct StaticHistory {
        vehicles: Vec<MotHistoryVehicle>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MotHistoryProvider for StaticHistory {
        async fn get_vehicle_history(&self, _registration_number: &str) -> Result<Vec<MotHistoryVehicle>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vehicles.clone())
        }
    }

    fn service(status: Arc<dyn VehicleStatusProvider>, history: Arc<StaticHistory>) -> VehicleDetailsService {
        VehicleDetailsService::new(status, history, Arc::new(FixedClock::new(fetched_at())))
    }

    #[tokio::test]
    async fn test_status_failure_aborts_before_history_call() {
        let history_provider = Arc::new(StaticHistory {
            vehicles: vec![history(vec![raw_test("PASSED", "2023.11.21 09:12:00", Some("2024.11.20"), "1")])],
            calls: AtomicUsize::new(0),
        });

        let result = service(Arc::new(FailingStatus), history_provider.clone())
            .fetch("AB12CDE")
            .await;

        assert!(matches!(result, Err(AggregationError::StatusFetch(_))));
        assert_eq!(history_provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_history_response_is_history_fetch_error() {
        let history_provider = Arc::new(StaticHistory {
            vehicles: Vec::new(),
            calls: AtomicUsize::new(0),
        });

        let result = service(Arc::new(OkStatus), history_provider).fetch("AB12CDE").await;

        assert!(matches!(
            result,
            Err(AggregationError::HistoryFetch(ProviderError::EmptyResponse))
        ));
    }

    #[tokio::test]
    async fn test_first_history_vehicle_is_used() {
        let mut other = history(vec![raw_test("FAILED", "2022.01.01 10:00:00", None, "999")]);
        other.make = Some("FORD".to_string());
        let history_provider = Arc::new(StaticHistory {
            vehicles: vec![
                history(vec![raw_test("PASSED", "2023.11.21 09:12:00", Some("2024.11.20"), "1")]),
                other,
            ],
            calls: AtomicUsize::new(0),
        });

        let details = service(Arc::new(OkStatus), history_provider)
            .fetch("AB12CDE")
            .await
            .unwrap();

        assert_eq!(details.manufacturer, "MAZDA");
        assert_eq!(details.mot_history.len(), 1);
        assert_eq!(details.mot_history[0].test_number, 1);
        assert_eq!(details.last_fetched_at, fetched_at());
    }
}
