//! Attendance record repository.
//!
//! The capture surface owns these rows; the engine only reads them for
//! aggregation and writes back the classification fields it owns
//! (hour split, overtime category, compliance flags).

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::attendance::{AttendanceRecord, HoursClassification};
use crate::types::{AttendanceRecordId, EmployeeId};

const COLUMNS: &str = "id, employee_id, attendance_date, clock_in, clock_out, \
     clock_in_latitude, clock_in_longitude, clock_in_address, \
     clock_out_latitude, clock_out_longitude, clock_out_address, \
     work_location, work_type, status, total_hours, regular_hours, overtime_hours, \
     overtime_type, is_night_overtime, is_holiday_overtime, overtime_amount, \
     offset_hours_earned, food_allowance_eligible, food_allowance_amount, \
     is_late, late_minutes, is_early_departure, early_departure_minutes, \
     exceeds_daily_limit, exceeds_overtime_limit, notes, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    /// All records of an employee in [start, end], ordered by date.
    async fn list_for_period(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, EngineError>;

    /// The record of an employee on a date (unique per employee + date).
    async fn find_by_employee_date(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, EngineError>;

    /// Write back the engine-owned classification fields. Returns rows
    /// touched.
    async fn update_classification(
        &self,
        db: &PgPool,
        id: AttendanceRecordId,
        classification: &HoursClassification,
        offset_hours_earned: Decimal,
    ) -> Result<u64, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceRepository;

impl AttendanceRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn list_for_period(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, EngineError> {
        let query = format!(
            "SELECT {} FROM attendance_records \
             WHERE employee_id = $1 AND attendance_date >= $2 AND attendance_date <= $3 \
             ORDER BY attendance_date",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(employee_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_employee_date(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, EngineError> {
        let query = format!(
            "SELECT {} FROM attendance_records \
             WHERE employee_id = $1 AND attendance_date = $2",
            COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn update_classification(
        &self,
        db: &PgPool,
        id: AttendanceRecordId,
        classification: &HoursClassification,
        offset_hours_earned: Decimal,
    ) -> Result<u64, EngineError> {
        let result = sqlx::query(
            "UPDATE attendance_records \
             SET total_hours = $1, regular_hours = $2, overtime_hours = $3, \
                 overtime_type = $4, is_night_overtime = $5, is_holiday_overtime = $6, \
                 offset_hours_earned = $7, exceeds_daily_limit = $8, \
                 exceeds_overtime_limit = $9, updated_at = NOW() \
             WHERE id = $10",
        )
        .bind(classification.total_hours)
        .bind(classification.regular_hours)
        .bind(classification.overtime_hours)
        .bind(classification.overtime_type)
        .bind(classification.is_night_overtime)
        .bind(classification.is_holiday_overtime)
        .bind(offset_hours_earned)
        .bind(classification.exceeds_daily_limit)
        .bind(classification.exceeds_overtime_limit)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
