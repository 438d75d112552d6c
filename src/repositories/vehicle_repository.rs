use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{MotTest, VehicleDetails, VehicleRecord};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

/// Filtro de búsqueda de vehículos; los criterios presentes se combinan con AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    pub user_id: Option<Uuid>,
    pub registration_number: Option<String>,
    /// `last_fetched_at` estrictamente anterior a este instante
    pub fetched_before: Option<DateTime<Utc>>,
}

impl VehicleFilter {
    pub fn owned_by(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn fetched_before(cutoff: DateTime<Utc>) -> Self {
        Self {
            fetched_before: Some(cutoff),
            ..Self::default()
        }
    }

    pub fn with_registration(mut self, registration_number: impl Into<String>) -> Self {
        self.registration_number = Some(registration_number.into());
        self
    }

    pub fn matches(&self, record: &VehicleRecord) -> bool {
        self.user_id.map_or(true, |user_id| record.user_id == user_id)
            && self
                .registration_number
                .as_deref()
                .map_or(true, |registration| record.registration_number() == registration)
            && self
                .fetched_before
                .map_or(true, |cutoff| record.last_fetched_at() < cutoff)
    }
}

/// Gateway de persistencia de vehículos
///
/// Compartido entre las rutas HTTP y el refresco en segundo plano. `replace`
/// no tiene control de concurrencia optimista: la última escritura gana.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insertar con id generado; `created_at` = `updated_at` = ahora
    async fn insert(&self, user_id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord>;

    /// Reemplazar todos los datos agregados conservando id, propietario y `created_at`
    async fn replace(&self, id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord>;

    async fn find(&self, filter: &VehicleFilter) -> AppResult<Vec<VehicleRecord>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleRecord>>;

    /// Devuelve `false` si no existía
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    user_id: Uuid,
    registration_number: String,
    manufacturer: String,
    model: String,
    mot_due: Option<DateTime<Utc>>,
    ved_due: Option<DateTime<Utc>>,
    mot_history: Json<Vec<MotTest>>,
    last_fetched_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for VehicleRecord {
    fn from(row: VehicleRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            details: VehicleDetails {
                registration_number: row.registration_number,
                manufacturer: row.manufacturer,
                model: row.model,
                mot_due: row.mot_due,
                ved_due: row.ved_due,
                mot_history: row.mot_history.0,
                last_fetched_at: row.last_fetched_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Implementación sobre PostgreSQL (tabla `vehicles`, historial en JSONB)
#[derive(Clone)]
pub struct PgVehicleStore {
    pool: PgPool,
}

impl PgVehicleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleStore {
    async fn insert(&self, user_id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord> {
        let now = Utc::now();
        let registration_number = details.registration_number.clone();

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (id, user_id, registration_number, manufacturer, model, mot_due, ved_due,
                                  mot_history, last_fetched_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(details.registration_number)
        .bind(details.manufacturer)
        .bind(details.model)
        .bind(details.mot_due)
        .bind(details.ved_due)
        .bind(Json(details.mot_history))
        .bind(details.last_fetched_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &registration_number))?;

        Ok(row.into())
    }

    async fn replace(&self, id: Uuid, details: VehicleDetails) -> AppResult<VehicleRecord> {
        let registration_number = details.registration_number.clone();

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            UPDATE vehicles
            SET registration_number = $2, manufacturer = $3, model = $4, mot_due = $5, ved_due = $6,
                mot_history = $7, last_fetched_at = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(details.registration_number)
        .bind(details.manufacturer)
        .bind(details.model)
        .bind(details.mot_due)
        .bind(details.ved_due)
        .bind(Json(details.mot_history))
        .bind(details.last_fetched_at)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &registration_number))?;

        row.map(Into::into)
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    async fn find(&self, filter: &VehicleFilter) -> AppResult<Vec<VehicleRecord>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM vehicles WHERE TRUE");

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(registration_number) = &filter.registration_number {
            query
                .push(" AND registration_number = ")
                .push_bind(registration_number.clone());
        }
        if let Some(cutoff) = filter.fetched_before {
            query.push(" AND last_fetched_at < ").push_bind(cutoff);
        }
        query.push(" ORDER BY created_at ASC");

        let rows = query
            .build_query_as::<VehicleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleRecord>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// La violación de `UNIQUE(user_id, registration_number)` es un 409, no un 500
fn map_unique_violation(error: sqlx::Error, registration_number: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            conflict_error("Vehicle", "registration number", registration_number)
        }
        _ => AppError::Database(error),
    }
}
