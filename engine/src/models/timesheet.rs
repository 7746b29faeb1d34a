use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::types::{EmployeeId, TimesheetId};

/// Timesheet approval workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TimesheetStatus {
    Draft,
    Submitted,
    ManagerApproved,
    HrApproved,
    Rejected,
    Exported,
}

impl Default for TimesheetStatus {
    fn default() -> Self {
        TimesheetStatus::Draft
    }
}

impl TimesheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimesheetStatus::Draft => "draft",
            TimesheetStatus::Submitted => "submitted",
            TimesheetStatus::ManagerApproved => "manager_approved",
            TimesheetStatus::HrApproved => "hr_approved",
            TimesheetStatus::Rejected => "rejected",
            TimesheetStatus::Exported => "exported",
        }
    }

    /// Generation may only touch draft or rejected timesheets; anything
    /// further along the approval chain is frozen.
    pub fn is_regenerable(&self) -> bool {
        matches!(self, TimesheetStatus::Draft | TimesheetStatus::Rejected)
    }
}

impl fmt::Display for TimesheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly aggregate over one employee's attendance, leave and overtime.
///
/// One row per (employee, year, month); regenerated by the aggregator while
/// in draft/rejected, then frozen through the approval chain.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Timesheet {
    pub id: TimesheetId,
    pub employee_id: EmployeeId,
    pub year: i32,
    pub month: i32,

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
    pub offset_hours_used: Decimal,

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

    pub status: TimesheetStatus,

    pub submitted_at: Option<DateTime<Utc>>,
    pub employee_notes: Option<String>,

    pub manager_approved_by: Option<EmployeeId>,
    pub manager_approved_at: Option<DateTime<Utc>>,
    pub manager_notes: Option<String>,

    pub hr_approved_by: Option<EmployeeId>,
    pub hr_approved_at: Option<DateTime<Utc>>,
    pub hr_notes: Option<String>,

    pub rejected_by: Option<EmployeeId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,

    pub exported_at: Option<DateTime<Utc>>,
    pub payroll_reference: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timesheet {
    /// A zeroed draft for the given period.
    pub fn new(employee_id: EmployeeId, year: i32, month: u32) -> Self {
        let now = Utc::now();
        Self {
            id: TimesheetId::new(),
            employee_id,
            year,
            month: month as i32,
            total_working_days: 0,
            total_present_days: 0,
            total_absent_days: 0,
            total_leave_days: Decimal::ZERO,
            total_wfh_days: 0,
            total_late_arrivals: 0,
            total_early_departures: 0,
            total_regular_hours: Decimal::ZERO,
            total_overtime_hours: Decimal::ZERO,
            total_night_overtime_hours: Decimal::ZERO,
            total_holiday_overtime_hours: Decimal::ZERO,
            total_overtime_amount: Decimal::ZERO,
            offset_hours_earned: Decimal::ZERO,
            offset_hours_used: Decimal::ZERO,
            days_at_head_office: 0,
            days_at_kezad: 0,
            days_at_safario: 0,
            days_at_sites: 0,
            days_at_meeting: 0,
            days_at_event: 0,
            food_allowance_days: 0,
            food_allowance_total: Decimal::ZERO,
            has_compliance_issues: false,
            compliance_notes: None,
            status: TimesheetStatus::Draft,
            submitted_at: None,
            employee_notes: None,
            manager_approved_by: None,
            manager_approved_at: None,
            manager_notes: None,
            hr_approved_by: None,
            hr_approved_at: None,
            hr_notes: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            exported_at: None,
            payroll_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}
