//! Monthly timesheet aggregation and approval.
//!
//! Generation is a pure fold ([`fold_period`]) over the month's attendance
//! rows and approved leave, written through a conditional upsert: repeat
//! runs over unchanged inputs produce identical aggregates, and a frozen
//! (submitted or later) timesheet is returned untouched.
//!
//! Approval transitions are guarded updates re-checking the expected
//! status at write time; the actor check runs in the same call, so there
//! is no window between authorization and write.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::db::DbPool;
use crate::error::EngineError;
use crate::models::attendance::{AttendanceRecord, AttendanceStatus, WorkLocation};
use crate::models::leave::LeaveRequest;
use crate::models::timesheet::{Timesheet, TimesheetStatus};
use crate::repositories::{
    AttendanceRepository, AttendanceRepositoryTrait, LeaveRequestRepository,
    LeaveRequestRepositoryTrait, TimesheetRepository, TimesheetRepositoryTrait,
};
use crate::services::ports::{EmployeeDirectory, Notifier};
use crate::types::{EmployeeId, TimesheetId};
use crate::utils::time::working_days_in_month;
use crate::validation::rules::validate_month;

/// Aggregate figures for one employee-month.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodTotals {
    pub total_working_days: i32,
    pub total_present_days: i32,
    pub total_absent_days: i32,
    pub total_leave_days: Decimal,
    pub total_wfh_days: i32,
    pub total_late_arrivals: i32,
    pub total_early_departures: i32,
    pub total_regular_hours: Decimal,
    pub total_overtime_hours: Decimal,
    pub total_night_overtime_hours: Decimal,
    pub total_holiday_overtime_hours: Decimal,
    pub total_overtime_amount: Decimal,
    pub offset_hours_earned: Decimal,
    pub days_at_head_office: i32,
    pub days_at_kezad: i32,
    pub days_at_safario: i32,
    pub days_at_sites: i32,
    pub days_at_meeting: i32,
    pub days_at_event: i32,
    pub food_allowance_days: i32,
    pub food_allowance_total: Decimal,
    pub has_compliance_issues: bool,
    pub compliance_notes: Option<String>,
}

impl PeriodTotals {
    pub fn apply_to(&self, sheet: &mut Timesheet) {
        sheet.total_working_days = self.total_working_days;
        sheet.total_present_days = self.total_present_days;
        sheet.total_absent_days = self.total_absent_days;
        sheet.total_leave_days = self.total_leave_days;
        sheet.total_wfh_days = self.total_wfh_days;
        sheet.total_late_arrivals = self.total_late_arrivals;
        sheet.total_early_departures = self.total_early_departures;
        sheet.total_regular_hours = self.total_regular_hours;
        sheet.total_overtime_hours = self.total_overtime_hours;
        sheet.total_night_overtime_hours = self.total_night_overtime_hours;
        sheet.total_holiday_overtime_hours = self.total_holiday_overtime_hours;
        sheet.total_overtime_amount = self.total_overtime_amount;
        sheet.offset_hours_earned = self.offset_hours_earned;
        sheet.days_at_head_office = self.days_at_head_office;
        sheet.days_at_kezad = self.days_at_kezad;
        sheet.days_at_safario = self.days_at_safario;
        sheet.days_at_sites = self.days_at_sites;
        sheet.days_at_meeting = self.days_at_meeting;
        sheet.days_at_event = self.days_at_event;
        sheet.food_allowance_days = self.food_allowance_days;
        sheet.food_allowance_total = self.food_allowance_total;
        sheet.has_compliance_issues = self.has_compliance_issues;
        sheet.compliance_notes = self.compliance_notes.clone();
    }
}

/// Fold a month of attendance rows and approved leave into one set of
/// totals. Pure over its inputs: running it twice on unchanged rows yields
/// identical values.
pub fn fold_period(
    records: &[AttendanceRecord],
    approved_leaves: &[LeaveRequest],
    year: i32,
    month: u32,
) -> Result<PeriodTotals, EngineError> {
    validate_month(month)
        .map_err(|e| EngineError::Validation(vec![format!("month: {}", e.code)]))?;
    let working_days = working_days_in_month(year, month)
        .ok_or_else(|| EngineError::Validation(vec!["month: out_of_range".into()]))?;

    let mut totals = PeriodTotals {
        total_working_days: working_days as i32,
        ..PeriodTotals::default()
    };
    let mut breach_notes: Vec<String> = Vec::new();

    for record in records {
        if record.counts_as_present() {
            totals.total_present_days += 1;
        } else if record.status == AttendanceStatus::Absent {
            totals.total_absent_days += 1;
        }

        match record.work_location {
            WorkLocation::WorkFromHome => totals.total_wfh_days += 1,
            WorkLocation::HeadOffice => totals.days_at_head_office += 1,
            WorkLocation::Kezad => totals.days_at_kezad += 1,
            WorkLocation::Safario => totals.days_at_safario += 1,
            WorkLocation::Sites => totals.days_at_sites += 1,
            WorkLocation::Meeting => totals.days_at_meeting += 1,
            WorkLocation::Event => totals.days_at_event += 1,
        }

        if record.is_late {
            totals.total_late_arrivals += 1;
        }
        if record.is_early_departure {
            totals.total_early_departures += 1;
        }

        totals.total_regular_hours += record.regular_hours.unwrap_or(Decimal::ZERO);
        let overtime = record.overtime_hours.unwrap_or(Decimal::ZERO);
        totals.total_overtime_hours += overtime;
        if record.is_night_overtime {
            totals.total_night_overtime_hours += overtime;
        }
        if record.is_holiday_overtime {
            totals.total_holiday_overtime_hours += overtime;
        }
        totals.total_overtime_amount += record.overtime_amount.unwrap_or(Decimal::ZERO);
        totals.offset_hours_earned += record.offset_hours_earned.unwrap_or(Decimal::ZERO);

        if record.food_allowance_eligible {
            totals.food_allowance_days += 1;
            totals.food_allowance_total += record.food_allowance_amount.unwrap_or(Decimal::ZERO);
        }

        if record.exceeds_daily_limit || record.exceeds_overtime_limit {
            totals.has_compliance_issues = true;
            breach_notes.push(format!("{}: exceeded limits", record.attendance_date));
        }
    }

    totals.total_leave_days = approved_leaves
        .iter()
        .map(|leave| leave.total_days)
        .sum::<Decimal>();

    if !breach_notes.is_empty() {
        totals.compliance_notes = Some(breach_notes.join("; "));
    }

    Ok(totals)
}

pub struct TimesheetService<
    T = TimesheetRepository,
    A = AttendanceRepository,
    L = LeaveRequestRepository,
> {
    db: DbPool,
    timesheets: T,
    attendance: A,
    leaves: L,
    directory: Arc<dyn EmployeeDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl TimesheetService {
    pub fn new(db: DbPool, directory: Arc<dyn EmployeeDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_parts(
            db,
            TimesheetRepository::new(),
            AttendanceRepository::new(),
            LeaveRequestRepository::new(),
            directory,
            notifier,
        )
    }
}

impl<T, A, L> TimesheetService<T, A, L>
where
    T: TimesheetRepositoryTrait,
    A: AttendanceRepositoryTrait,
    L: LeaveRequestRepositoryTrait,
{
    pub fn with_parts(
        db: DbPool,
        timesheets: T,
        attendance: A,
        leaves: L,
        directory: Arc<dyn EmployeeDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            timesheets,
            attendance,
            leaves,
            directory,
            notifier,
        }
    }

    /// Generate (or regenerate) the timesheet for an employee-month.
    ///
    /// A timesheet that has been submitted or further approved is returned
    /// unchanged; a concurrent generate for the same key resolves through
    /// the storage upsert with the loser seeing the surviving row.
    pub async fn generate(
        &self,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> Result<Timesheet, EngineError> {
        validate_month(month)
            .map_err(|e| EngineError::Validation(vec![format!("month: {}", e.code)]))?;
        let (first, last) = crate::utils::time::month_bounds(year, month)
            .ok_or_else(|| EngineError::Validation(vec!["month: out_of_range".into()]))?;

        let existing = self
            .timesheets
            .find_by_period(&self.db, employee_id, year, month)
            .await?;
        if let Some(sheet) = &existing {
            if !sheet.status.is_regenerable() {
                tracing::debug!(
                    timesheet_id = %sheet.id,
                    status = sheet.status.as_str(),
                    "timesheet frozen, generation skipped"
                );
                return Ok(sheet.clone());
            }
        }

        let records = self
            .attendance
            .list_for_period(&self.db, employee_id, first, last)
            .await?;
        let leaves = self
            .leaves
            .find_approved_overlapping(&self.db, employee_id, first, last)
            .await?;
        let totals = fold_period(&records, &leaves, year, month)?;

        let mut sheet = existing.unwrap_or_else(|| Timesheet::new(employee_id, year, month));
        totals.apply_to(&mut sheet);
        sheet.updated_at = Utc::now();

        let stored = self.timesheets.upsert_generated(&self.db, &sheet).await?;
        tracing::info!(
            timesheet_id = %stored.id,
            employee_id = %employee_id,
            year,
            month,
            "timesheet generated"
        );
        Ok(stored)
    }

    /// Employee (or HR) submits the timesheet for approval.
    pub async fn submit(
        &self,
        id: TimesheetId,
        actor_id: EmployeeId,
        notes: Option<&str>,
    ) -> Result<Timesheet, EngineError> {
        let sheet = self.timesheets.find_by_id(&self.db, id).await?;
        if sheet.employee_id != actor_id && !self.directory.is_hr(actor_id).await? {
            return Err(EngineError::NotAuthorized(
                "only the owner or HR may submit a timesheet".into(),
            ));
        }

        match self
            .timesheets
            .submit(&self.db, id, notes.map(str::to_string), Utc::now())
            .await?
        {
            Some(updated) => {
                self.notify(&updated).await;
                Ok(updated)
            }
            None => Err(self.transition_error(id, "submit").await),
        }
    }

    /// Line-manager approval (HR may override).
    pub async fn manager_approve(
        &self,
        id: TimesheetId,
        actor_id: EmployeeId,
        notes: Option<&str>,
    ) -> Result<Timesheet, EngineError> {
        let sheet = self.timesheets.find_by_id(&self.db, id).await?;
        self.ensure_manager_of(&sheet, actor_id).await?;

        match self
            .timesheets
            .manager_approve(&self.db, id, actor_id, notes.map(str::to_string), Utc::now())
            .await?
        {
            Some(updated) => {
                self.notify(&updated).await;
                Ok(updated)
            }
            None => Err(self.transition_error(id, "manager-approve").await),
        }
    }

    /// Final HR approval.
    pub async fn hr_approve(
        &self,
        id: TimesheetId,
        actor_id: EmployeeId,
        notes: Option<&str>,
    ) -> Result<Timesheet, EngineError> {
        self.ensure_hr(actor_id).await?;
        // Row existence surfaces as NotFound before the guarded update.
        self.timesheets.find_by_id(&self.db, id).await?;

        match self
            .timesheets
            .hr_approve(&self.db, id, actor_id, notes.map(str::to_string), Utc::now())
            .await?
        {
            Some(updated) => {
                self.notify(&updated).await;
                Ok(updated)
            }
            None => Err(self.transition_error(id, "hr-approve").await),
        }
    }

    /// Reject a submitted or manager-approved timesheet with a reason.
    ///
    /// Who may reject follows who would approve at the current stage.
    pub async fn reject(
        &self,
        id: TimesheetId,
        actor_id: EmployeeId,
        reason: &str,
    ) -> Result<Timesheet, EngineError> {
        let sheet = self.timesheets.find_by_id(&self.db, id).await?;

        let expected = match sheet.status {
            TimesheetStatus::Submitted => {
                self.ensure_manager_of(&sheet, actor_id).await?;
                TimesheetStatus::Submitted
            }
            TimesheetStatus::ManagerApproved => {
                self.ensure_hr(actor_id).await?;
                TimesheetStatus::ManagerApproved
            }
            other => {
                return Err(EngineError::InvalidStateTransition(format!(
                    "cannot reject a timesheet in {} status",
                    other
                )))
            }
        };

        match self
            .timesheets
            .reject_from(&self.db, id, expected, actor_id, reason, Utc::now())
            .await?
        {
            Some(updated) => {
                self.notify(&updated).await;
                Ok(updated)
            }
            None => Err(self.transition_error(id, "reject").await),
        }
    }

    /// Hand an HR-approved timesheet to payroll.
    pub async fn export(
        &self,
        id: TimesheetId,
        actor_id: EmployeeId,
        payroll_reference: Option<&str>,
    ) -> Result<Timesheet, EngineError> {
        self.ensure_hr(actor_id).await?;
        self.timesheets.find_by_id(&self.db, id).await?;

        match self
            .timesheets
            .mark_exported(&self.db, id, payroll_reference.map(str::to_string), Utc::now())
            .await?
        {
            Some(updated) => {
                self.notify(&updated).await;
                Ok(updated)
            }
            None => Err(self.transition_error(id, "export").await),
        }
    }

    /// All timesheets of a period, for the HR overview.
    pub async fn list_for_period(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<Timesheet>, EngineError> {
        self.timesheets.list_for_period(&self.db, year, month).await
    }

    async fn ensure_hr(&self, actor_id: EmployeeId) -> Result<(), EngineError> {
        if self.directory.is_hr(actor_id).await? {
            Ok(())
        } else {
            Err(EngineError::NotAuthorized(
                "HR role required for this transition".into(),
            ))
        }
    }

    async fn ensure_manager_of(
        &self,
        sheet: &Timesheet,
        actor_id: EmployeeId,
    ) -> Result<(), EngineError> {
        if self.directory.is_hr(actor_id).await? {
            return Ok(());
        }
        let manager = self.directory.line_manager_of(sheet.employee_id).await?;
        if manager == Some(actor_id) {
            Ok(())
        } else {
            Err(EngineError::NotAuthorized(
                "only the employee's line manager or HR may act on this timesheet".into(),
            ))
        }
    }

    /// The guarded update hit zero rows: report the status found now.
    async fn transition_error(&self, id: TimesheetId, action: &str) -> EngineError {
        match self.timesheets.find_by_id(&self.db, id).await {
            Ok(current) => EngineError::InvalidStateTransition(format!(
                "cannot {} a timesheet in {} status",
                action, current.status
            )),
            Err(err) => err,
        }
    }

    async fn notify(&self, sheet: &Timesheet) {
        if let Err(err) = self.notifier.timesheet_status_changed(sheet).await {
            tracing::warn!(
                error = %err,
                timesheet_id = %sheet.id,
                "timesheet status notification failed"
            );
        }
    }
}
