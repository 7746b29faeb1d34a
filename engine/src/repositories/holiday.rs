//! Public holiday repository.
//!
//! Read-mostly reference data: HR inserts rows, deactivation is logical.
//! All lookups honor `is_active` and treat `start_date..=end_date` as an
//! inclusive interval.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::holiday::PublicHoliday;
use crate::types::HolidayId;

const COLUMNS: &str = "id, name, start_date, end_date, year, holiday_type, is_paid, \
     description, is_active, created_by, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HolidayRepositoryTrait: Send + Sync {
    /// Active holidays intersecting [start, end], ordered by start date.
    async fn find_in_range(
        &self,
        db: &PgPool,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, EngineError>;

    /// The active holiday covering a date, if any.
    async fn find_on(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Option<PublicHoliday>, EngineError>;

    /// Active holidays of a year, ordered by start date.
    async fn list_for_year(
        &self,
        db: &PgPool,
        year: i32,
    ) -> Result<Vec<PublicHoliday>, EngineError>;

    /// Insert a holiday row.
    async fn insert(
        &self,
        db: &PgPool,
        item: &PublicHoliday,
    ) -> Result<PublicHoliday, EngineError>;

    /// Logical delete. Returns rows touched.
    async fn deactivate(&self, db: &PgPool, id: HolidayId) -> Result<u64, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HolidayRepository;

impl HolidayRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HolidayRepositoryTrait for HolidayRepository {
    async fn find_in_range(
        &self,
        db: &PgPool,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        let query = format!(
            "SELECT {} FROM public_holidays \
             WHERE is_active = TRUE AND start_date <= $2 AND end_date >= $1 \
             ORDER BY start_date",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, PublicHoliday>(&query)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_on(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Option<PublicHoliday>, EngineError> {
        let query = format!(
            "SELECT {} FROM public_holidays \
             WHERE is_active = TRUE AND start_date <= $1 AND end_date >= $1 \
             ORDER BY start_date LIMIT 1",
            COLUMNS
        );
        let row = sqlx::query_as::<_, PublicHoliday>(&query)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list_for_year(
        &self,
        db: &PgPool,
        year: i32,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        let query = format!(
            "SELECT {} FROM public_holidays \
             WHERE is_active = TRUE AND year = $1 ORDER BY start_date",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, PublicHoliday>(&query)
            .bind(year)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn insert(
        &self,
        db: &PgPool,
        item: &PublicHoliday,
    ) -> Result<PublicHoliday, EngineError> {
        let query = format!(
            "INSERT INTO public_holidays ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {}",
            COLUMNS, COLUMNS
        );
        let row = sqlx::query_as::<_, PublicHoliday>(&query)
            .bind(item.id)
            .bind(&item.name)
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(item.year)
            .bind(item.holiday_type)
            .bind(item.is_paid)
            .bind(&item.description)
            .bind(item.is_active)
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn deactivate(&self, db: &PgPool, id: HolidayId) -> Result<u64, EngineError> {
        let result =
            sqlx::query("UPDATE public_holidays SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }
}
