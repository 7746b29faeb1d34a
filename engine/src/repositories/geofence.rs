//! Geofence repository.
//!
//! Zones are scanned in definition order (creation time) by the validator;
//! deactivation is logical so historical attendance keeps its context.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::geofence::Geofence;
use crate::types::GeofenceId;

const COLUMNS: &str = "id, name, description, latitude, longitude, radius_meters, address, \
     is_active, validation_required, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeofenceRepositoryTrait: Send + Sync {
    /// Active zones in definition order.
    async fn list_active(&self, db: &PgPool) -> Result<Vec<Geofence>, EngineError>;

    /// Active zone by its unique name.
    async fn find_active_by_name(
        &self,
        db: &PgPool,
        name: &str,
    ) -> Result<Option<Geofence>, EngineError>;

    /// Insert a zone; duplicate names are a conflict.
    async fn insert(&self, db: &PgPool, item: &Geofence) -> Result<Geofence, EngineError>;

    /// Logical delete. Returns rows touched.
    async fn deactivate(&self, db: &PgPool, id: GeofenceId) -> Result<u64, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GeofenceRepository;

impl GeofenceRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GeofenceRepositoryTrait for GeofenceRepository {
    async fn list_active(&self, db: &PgPool) -> Result<Vec<Geofence>, EngineError> {
        let query = format!(
            "SELECT {} FROM geofences WHERE is_active = TRUE ORDER BY created_at, name",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, Geofence>(&query).fetch_all(db).await?;
        Ok(rows)
    }

    async fn find_active_by_name(
        &self,
        db: &PgPool,
        name: &str,
    ) -> Result<Option<Geofence>, EngineError> {
        let query = format!(
            "SELECT {} FROM geofences WHERE is_active = TRUE AND name = $1",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Geofence>(&query)
            .bind(name)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn insert(&self, db: &PgPool, item: &Geofence) -> Result<Geofence, EngineError> {
        let query = format!(
            "INSERT INTO geofences ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            COLUMNS, COLUMNS
        );
        let result = sqlx::query_as::<_, Geofence>(&query)
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.latitude)
            .bind(item.longitude)
            .bind(item.radius_meters)
            .bind(&item.address)
            .bind(item.is_active)
            .bind(item.validation_required)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                EngineError::Conflict(format!("geofence '{}' already exists", item.name)),
            ),
            Err(err) => Err(err.into()),
        }
    }

    async fn deactivate(&self, db: &PgPool, id: GeofenceId) -> Result<u64, EngineError> {
        let result =
            sqlx::query("UPDATE geofences SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }
}
