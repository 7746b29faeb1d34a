//! Attendance classification.
//!
//! The capture surface writes the raw rows (clock times, GPS, location);
//! this service derives and persists the fields the engine owns: the
//! regular/overtime hour split, the overtime category and the compliance
//! flags. Aggregation reads these finalized fields at month end.

use chrono::NaiveDate;

use crate::db::DbPool;
use crate::error::EngineError;
use crate::models::attendance::{classify_hours, AttendanceRecord, ClassificationLimits};
use crate::repositories::{
    AttendanceRepository, AttendanceRepositoryTrait, HolidayRepository, HolidayRepositoryTrait,
};
use crate::types::EmployeeId;

pub struct AttendanceService<A = AttendanceRepository, H = HolidayRepository> {
    db: DbPool,
    attendance: A,
    holidays: H,
    limits: ClassificationLimits,
}

impl AttendanceService {
    pub fn new(db: DbPool, limits: ClassificationLimits) -> Self {
        Self::with_parts(
            db,
            AttendanceRepository::new(),
            HolidayRepository::new(),
            limits,
        )
    }
}

impl<A, H> AttendanceService<A, H>
where
    A: AttendanceRepositoryTrait,
    H: HolidayRepositoryTrait,
{
    pub fn with_parts(db: DbPool, attendance: A, holidays: H, limits: ClassificationLimits) -> Self {
        Self {
            db,
            attendance,
            holidays,
            limits,
        }
    }

    /// Classify one finalized day and persist the classification fields.
    ///
    /// Requires both clock times; a day still in progress cannot be
    /// classified. Overtime earns equivalent offset hours.
    pub async fn classify_day(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, EngineError> {
        let record = self
            .attendance
            .find_by_employee_date(&self.db, employee_id, date)
            .await?
            .ok_or_else(|| EngineError::NotFound("attendance record".into()))?;

        let (Some(clock_in), Some(clock_out)) = (record.clock_in, record.clock_out) else {
            return Err(EngineError::Validation(vec![
                "attendance record needs clock-in and clock-out before classification".into(),
            ]));
        };

        let on_holiday = self
            .holidays
            .find_on(&self.db, record.attendance_date)
            .await?
            .is_some();

        let classification = classify_hours(clock_in, clock_out, on_holiday, &self.limits);
        let offset_hours_earned = classification.overtime_hours;

        let touched = self
            .attendance
            .update_classification(&self.db, record.id, &classification, offset_hours_earned)
            .await?;
        if touched == 0 {
            return Err(EngineError::NotFound("attendance record".into()));
        }

        tracing::debug!(
            employee_id = %employee_id,
            date = %date,
            overtime_hours = %classification.overtime_hours,
            overtime_type = ?classification.overtime_type,
            "attendance day classified"
        );

        let mut updated = record;
        updated.total_hours = Some(classification.total_hours);
        updated.regular_hours = Some(classification.regular_hours);
        updated.overtime_hours = Some(classification.overtime_hours);
        updated.overtime_type = classification.overtime_type;
        updated.is_night_overtime = classification.is_night_overtime;
        updated.is_holiday_overtime = classification.is_holiday_overtime;
        updated.offset_hours_earned = Some(offset_hours_earned);
        updated.exceeds_daily_limit = classification.exceeds_daily_limit;
        updated.exceeds_overtime_limit = classification.exceeds_overtime_limit;
        Ok(updated)
    }

    /// Records of an employee in a date range, ordered by date.
    pub async fn records_for_period(
        &self,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, EngineError> {
        if end_date < start_date {
            return Err(EngineError::InvalidDateRange);
        }
        self.attendance
            .list_for_period(&self.db, employee_id, start_date, end_date)
            .await
    }
}
