//! Timesheet repository.
//!
//! The `(employee_id, year, month)` unique index is the authority on
//! duplicates: concurrent generation resolves through the conditional
//! upsert, and every status transition is a guarded UPDATE whose WHERE
//! clause re-checks the expected state at write time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::timesheet::{Timesheet, TimesheetStatus};
use crate::types::{EmployeeId, TimesheetId};

const COLUMNS: &str = "id, employee_id, year, month, \
     total_working_days, total_present_days, total_absent_days, total_leave_days, \
     total_wfh_days, total_late_arrivals, total_early_departures, \
     total_regular_hours, total_overtime_hours, total_night_overtime_hours, \
     total_holiday_overtime_hours, total_overtime_amount, \
     offset_hours_earned, offset_hours_used, \
     days_at_head_office, days_at_kezad, days_at_safario, days_at_sites, \
     days_at_meeting, days_at_event, food_allowance_days, food_allowance_total, \
     has_compliance_issues, compliance_notes, status, \
     submitted_at, employee_notes, \
     manager_approved_by, manager_approved_at, manager_notes, \
     hr_approved_by, hr_approved_at, hr_notes, \
     rejected_by, rejected_at, rejection_reason, \
     exported_at, payroll_reference, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimesheetRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, db: &PgPool, id: TimesheetId) -> Result<Timesheet, EngineError>;

    async fn find_by_period(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> Result<Option<Timesheet>, EngineError>;

    /// All timesheets of a period, for the HR overview.
    async fn list_for_period(
        &self,
        db: &PgPool,
        year: i32,
        month: u32,
    ) -> Result<Vec<Timesheet>, EngineError>;

    /// Write a generated timesheet.
    ///
    /// Inserts the row or, when the unique key already exists, replaces the
    /// aggregate fields — but only while the existing row is still draft or
    /// rejected. A frozen row wins the conflict and is returned unchanged,
    /// so the loser of a concurrent generate sees a successful no-op.
    async fn upsert_generated(
        &self,
        db: &PgPool,
        item: &Timesheet,
    ) -> Result<Timesheet, EngineError>;

    /// draft/rejected -> submitted. None when the row was not submittable.
    async fn submit(
        &self,
        db: &PgPool,
        id: TimesheetId,
        employee_notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError>;

    /// submitted -> manager_approved.
    async fn manager_approve(
        &self,
        db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError>;

    /// manager_approved -> hr_approved.
    async fn hr_approve(
        &self,
        db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError>;

    /// expected -> rejected, with the rejecting actor and reason.
    async fn reject_from(
        &self,
        db: &PgPool,
        id: TimesheetId,
        expected: TimesheetStatus,
        actor_id: EmployeeId,
        reason: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError>;

    /// hr_approved -> exported.
    async fn mark_exported(
        &self,
        db: &PgPool,
        id: TimesheetId,
        payroll_reference: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimesheetRepository;

impl TimesheetRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimesheetRepositoryTrait for TimesheetRepository {
    async fn find_by_id(&self, db: &PgPool, id: TimesheetId) -> Result<Timesheet, EngineError> {
        let query = format!("SELECT {} FROM timesheets WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, Timesheet>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("timesheet".into()))
    }

    async fn find_by_period(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "SELECT {} FROM timesheets WHERE employee_id = $1 AND year = $2 AND month = $3",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(employee_id)
            .bind(year)
            .bind(month as i32)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list_for_period(
        &self,
        db: &PgPool,
        year: i32,
        month: u32,
    ) -> Result<Vec<Timesheet>, EngineError> {
        let query = format!(
            "SELECT {} FROM timesheets WHERE year = $1 AND month = $2 ORDER BY employee_id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, Timesheet>(&query)
            .bind(year)
            .bind(month as i32)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn upsert_generated(
        &self,
        db: &PgPool,
        item: &Timesheet,
    ) -> Result<Timesheet, EngineError> {
        let query = format!(
            "INSERT INTO timesheets ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, \
                     $31, $32, $33, $34, $35, $36, $37, $38, $39, $40, $41, $42, $43, $44) \
             ON CONFLICT (employee_id, year, month) DO UPDATE SET \
                 total_working_days = EXCLUDED.total_working_days, \
                 total_present_days = EXCLUDED.total_present_days, \
                 total_absent_days = EXCLUDED.total_absent_days, \
                 total_leave_days = EXCLUDED.total_leave_days, \
                 total_wfh_days = EXCLUDED.total_wfh_days, \
                 total_late_arrivals = EXCLUDED.total_late_arrivals, \
                 total_early_departures = EXCLUDED.total_early_departures, \
                 total_regular_hours = EXCLUDED.total_regular_hours, \
                 total_overtime_hours = EXCLUDED.total_overtime_hours, \
                 total_night_overtime_hours = EXCLUDED.total_night_overtime_hours, \
                 total_holiday_overtime_hours = EXCLUDED.total_holiday_overtime_hours, \
                 total_overtime_amount = EXCLUDED.total_overtime_amount, \
                 offset_hours_earned = EXCLUDED.offset_hours_earned, \
                 offset_hours_used = EXCLUDED.offset_hours_used, \
                 days_at_head_office = EXCLUDED.days_at_head_office, \
                 days_at_kezad = EXCLUDED.days_at_kezad, \
                 days_at_safario = EXCLUDED.days_at_safario, \
                 days_at_sites = EXCLUDED.days_at_sites, \
                 days_at_meeting = EXCLUDED.days_at_meeting, \
                 days_at_event = EXCLUDED.days_at_event, \
                 food_allowance_days = EXCLUDED.food_allowance_days, \
                 food_allowance_total = EXCLUDED.food_allowance_total, \
                 has_compliance_issues = EXCLUDED.has_compliance_issues, \
                 compliance_notes = EXCLUDED.compliance_notes, \
                 updated_at = EXCLUDED.updated_at \
             WHERE timesheets.status IN ('draft', 'rejected') \
             RETURNING {}",
            COLUMNS, COLUMNS
        );

        let upserted = sqlx::query_as::<_, Timesheet>(&query)
            .bind(item.id)
            .bind(item.employee_id)
            .bind(item.year)
            .bind(item.month)
            .bind(item.total_working_days)
            .bind(item.total_present_days)
            .bind(item.total_absent_days)
            .bind(item.total_leave_days)
            .bind(item.total_wfh_days)
            .bind(item.total_late_arrivals)
            .bind(item.total_early_departures)
            .bind(item.total_regular_hours)
            .bind(item.total_overtime_hours)
            .bind(item.total_night_overtime_hours)
            .bind(item.total_holiday_overtime_hours)
            .bind(item.total_overtime_amount)
            .bind(item.offset_hours_earned)
            .bind(item.offset_hours_used)
            .bind(item.days_at_head_office)
            .bind(item.days_at_kezad)
            .bind(item.days_at_safario)
            .bind(item.days_at_sites)
            .bind(item.days_at_meeting)
            .bind(item.days_at_event)
            .bind(item.food_allowance_days)
            .bind(item.food_allowance_total)
            .bind(item.has_compliance_issues)
            .bind(&item.compliance_notes)
            .bind(item.status)
            .bind(item.submitted_at)
            .bind(&item.employee_notes)
            .bind(item.manager_approved_by)
            .bind(item.manager_approved_at)
            .bind(&item.manager_notes)
            .bind(item.hr_approved_by)
            .bind(item.hr_approved_at)
            .bind(&item.hr_notes)
            .bind(item.rejected_by)
            .bind(item.rejected_at)
            .bind(&item.rejection_reason)
            .bind(item.exported_at)
            .bind(&item.payroll_reference)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?;

        match upserted {
            Some(row) => Ok(row),
            // The conditional update skipped a frozen row: return it as-is.
            None => self
                .find_by_period(db, item.employee_id, item.year, item.month as u32)
                .await?
                .ok_or_else(|| EngineError::NotFound("timesheet".into())),
        }
    }

    async fn submit(
        &self,
        db: &PgPool,
        id: TimesheetId,
        employee_notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "UPDATE timesheets \
             SET status = $1, submitted_at = $2, employee_notes = $3, updated_at = $2 \
             WHERE id = $4 AND status IN ('draft', 'rejected') \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(TimesheetStatus::Submitted)
            .bind(timestamp)
            .bind(employee_notes)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn manager_approve(
        &self,
        db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "UPDATE timesheets \
             SET status = $1, manager_approved_by = $2, manager_approved_at = $3, \
                 manager_notes = $4, updated_at = $3 \
             WHERE id = $5 AND status = 'submitted' \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(TimesheetStatus::ManagerApproved)
            .bind(approver_id)
            .bind(timestamp)
            .bind(notes)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn hr_approve(
        &self,
        db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "UPDATE timesheets \
             SET status = $1, hr_approved_by = $2, hr_approved_at = $3, hr_notes = $4, \
                 updated_at = $3 \
             WHERE id = $5 AND status = 'manager_approved' \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(TimesheetStatus::HrApproved)
            .bind(approver_id)
            .bind(timestamp)
            .bind(notes)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn reject_from(
        &self,
        db: &PgPool,
        id: TimesheetId,
        expected: TimesheetStatus,
        actor_id: EmployeeId,
        reason: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "UPDATE timesheets \
             SET status = $1, rejected_by = $2, rejected_at = $3, rejection_reason = $4, \
                 updated_at = $3 \
             WHERE id = $5 AND status = $6 \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(TimesheetStatus::Rejected)
            .bind(actor_id)
            .bind(timestamp)
            .bind(reason)
            .bind(id)
            .bind(expected)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn mark_exported(
        &self,
        db: &PgPool,
        id: TimesheetId,
        payroll_reference: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        let query = format!(
            "UPDATE timesheets \
             SET status = $1, exported_at = $2, payroll_reference = $3, updated_at = $2 \
             WHERE id = $4 AND status = 'hr_approved' \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, Timesheet>(&query)
            .bind(TimesheetStatus::Exported)
            .bind(timestamp)
            .bind(payroll_reference)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }
}
