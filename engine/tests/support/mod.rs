#![allow(dead_code)]
//! In-memory test doubles for the repository and collaborator traits.
//!
//! The fakes reproduce the storage-layer contracts the services rely on:
//! guarded status transitions (compare-and-set on the current status),
//! the per-employee overlap re-check on insert, and the conditional
//! timesheet upsert that leaves frozen rows untouched.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use worktally_engine::db::DbPool;
use worktally_engine::error::EngineError;
use worktally_engine::models::attendance::{
    AttendanceRecord, AttendanceStatus, HoursClassification, OvertimeType, WorkLocation, WorkType,
};
use worktally_engine::models::holiday::PublicHoliday;
use worktally_engine::models::leave::{LeaveRequest, LeaveStatus, LeaveType};
use worktally_engine::models::leave_balance::LeaveBalance;
use worktally_engine::models::timesheet::{Timesheet, TimesheetStatus};
use worktally_engine::repositories::{
    AttendanceRepositoryTrait, HolidayRepositoryTrait, LeaveBalanceRepositoryTrait,
    LeaveRequestRepositoryTrait, TimesheetRepositoryTrait,
};
use worktally_engine::services::ports::{EmployeeDirectory, Notifier};
use worktally_engine::types::{
    AttendanceRecordId, EmployeeId, HolidayId, LeaveRequestId, TimesheetId,
};

/// Pool handle for the fakes; never actually connected.
pub fn lazy_pool() -> DbPool {
    Arc::new(
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/worktally_test")
            .expect("lazy pool"),
    )
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[derive(Default)]
pub struct FakeState {
    pub requests: Vec<LeaveRequest>,
    pub balances: Vec<LeaveBalance>,
    pub holidays: Vec<PublicHoliday>,
    pub records: Vec<AttendanceRecord>,
    pub timesheets: Vec<Timesheet>,
}

/// One handle implementing every repository trait over shared state.
#[derive(Clone, Default)]
pub struct FakeRepos {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRepos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().expect("fake state lock");
        f(&mut guard)
    }

    pub fn balance_of(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Option<LeaveBalance> {
        self.with_state(|state| {
            state
                .balances
                .iter()
                .find(|b| {
                    b.employee_id == employee_id && b.leave_type == leave_type && b.year == year
                })
                .cloned()
        })
    }
}

fn overlaps(request: &LeaveRequest, start: NaiveDate, end: NaiveDate) -> bool {
    request.start_date <= end && request.end_date >= start
}

#[async_trait]
impl LeaveRequestRepositoryTrait for FakeRepos {
    async fn find_by_id(
        &self,
        _db: &PgPool,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, EngineError> {
        self.with_state(|state| {
            state
                .requests
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound("leave request".into()))
        })
    }

    async fn find_by_employee(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .requests
                .iter()
                .filter(|r| r.employee_id == employee_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        })
    }

    async fn find_overlapping(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<LeaveRequest>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .requests
                .iter()
                .find(|r| {
                    r.employee_id == employee_id
                        && matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved)
                        && overlaps(r, start_date, end_date)
                })
                .cloned())
        })
    }

    async fn find_approved_overlapping(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .requests
                .iter()
                .filter(|r| {
                    r.employee_id == employee_id
                        && r.status == LeaveStatus::Approved
                        && overlaps(r, start_date, end_date)
                })
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.start_date);
            Ok(rows)
        })
    }

    async fn insert_pending(
        &self,
        _db: &PgPool,
        item: &LeaveRequest,
    ) -> Result<LeaveRequest, EngineError> {
        self.with_state(|state| {
            if let Some(conflict) = state.requests.iter().find(|r| {
                r.employee_id == item.employee_id
                    && matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved)
                    && overlaps(r, item.start_date, item.end_date)
            }) {
                return Err(EngineError::OverlappingRequest {
                    conflicting_id: conflict.id,
                });
            }
            state.requests.push(item.clone());
            Ok(item.clone())
        })
    }

    async fn approve_and_reserve(
        &self,
        _db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(request) = state
                .requests
                .iter_mut()
                .find(|r| r.id == id && r.status == LeaveStatus::Pending)
            else {
                return Ok(0);
            };
            request.status = LeaveStatus::Approved;
            request.approved_by = Some(approver_id);
            request.approved_at = Some(timestamp);
            request.updated_at = timestamp;

            let employee_id = request.employee_id;
            let leave_type = request.leave_type;
            let year = request.start_date.year();
            let days = request.total_days;

            match state.balances.iter_mut().find(|b| {
                b.employee_id == employee_id && b.leave_type == leave_type && b.year == year
            }) {
                Some(balance) => {
                    balance.pending += days;
                    balance.updated_at = timestamp;
                }
                None => {
                    let mut balance = LeaveBalance::zeroed(employee_id, year, leave_type);
                    balance.pending = days;
                    state.balances.push(balance);
                }
            }
            Ok(1)
        })
    }

    async fn reject(
        &self,
        _db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(request) = state
                .requests
                .iter_mut()
                .find(|r| r.id == id && r.status == LeaveStatus::Pending)
            else {
                return Ok(0);
            };
            request.status = LeaveStatus::Rejected;
            request.approved_by = Some(approver_id);
            request.rejection_reason = reason;
            request.updated_at = timestamp;
            Ok(1)
        })
    }

    async fn cancel(
        &self,
        _db: &PgPool,
        id: LeaveRequestId,
        employee_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(request) = state.requests.iter_mut().find(|r| {
                r.id == id && r.employee_id == employee_id && r.status == LeaveStatus::Pending
            }) else {
                return Ok(0);
            };
            request.status = LeaveStatus::Cancelled;
            request.updated_at = timestamp;
            Ok(1)
        })
    }

    async fn mark_manager_notified(
        &self,
        _db: &PgPool,
        id: LeaveRequestId,
        manager_email: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(request) = state.requests.iter_mut().find(|r| r.id == id) else {
                return Ok(0);
            };
            request.manager_email = Some(manager_email.to_string());
            request.manager_notified = true;
            request.notification_sent_at = Some(timestamp);
            Ok(1)
        })
    }
}

#[async_trait]
impl LeaveBalanceRepositoryTrait for FakeRepos {
    async fn find(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<Option<LeaveBalance>, EngineError> {
        Ok(self.balance_of(employee_id, leave_type, year))
    }

    async fn list_for_year(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .balances
                .iter()
                .filter(|b| b.employee_id == employee_id && b.year == year)
                .cloned()
                .collect())
        })
    }

    async fn seed(&self, _db: &PgPool, balance: &LeaveBalance) -> Result<bool, EngineError> {
        self.with_state(|state| {
            let exists = state.balances.iter().any(|b| {
                b.employee_id == balance.employee_id
                    && b.leave_type == balance.leave_type
                    && b.year == balance.year
            });
            if exists {
                return Ok(false);
            }
            state.balances.push(balance.clone());
            Ok(true)
        })
    }

    async fn adjust(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        delta: Decimal,
        reason: &str,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(balance) = state.balances.iter_mut().find(|b| {
                b.employee_id == employee_id && b.leave_type == leave_type && b.year == year
            }) else {
                return Ok(0);
            };
            balance.adjustment += delta;
            balance.adjustment_reason = Some(reason.to_string());
            Ok(1)
        })
    }
}

#[async_trait]
impl HolidayRepositoryTrait for FakeRepos {
    async fn find_in_range(
        &self,
        _db: &PgPool,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .holidays
                .iter()
                .filter(|h| h.is_active && h.start_date <= end_date && h.end_date >= start_date)
                .cloned()
                .collect();
            rows.sort_by_key(|h| h.start_date);
            Ok(rows)
        })
    }

    async fn find_on(
        &self,
        _db: &PgPool,
        date: NaiveDate,
    ) -> Result<Option<PublicHoliday>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .holidays
                .iter()
                .find(|h| h.is_active && h.contains(date))
                .cloned())
        })
    }

    async fn list_for_year(
        &self,
        _db: &PgPool,
        year: i32,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .holidays
                .iter()
                .filter(|h| h.is_active && h.year == year)
                .cloned()
                .collect();
            rows.sort_by_key(|h| h.start_date);
            Ok(rows)
        })
    }

    async fn insert(
        &self,
        _db: &PgPool,
        item: &PublicHoliday,
    ) -> Result<PublicHoliday, EngineError> {
        self.with_state(|state| {
            state.holidays.push(item.clone());
            Ok(item.clone())
        })
    }

    async fn deactivate(&self, _db: &PgPool, id: HolidayId) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(holiday) = state.holidays.iter_mut().find(|h| h.id == id) else {
                return Ok(0);
            };
            holiday.is_active = false;
            Ok(1)
        })
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for FakeRepos {
    async fn list_for_period(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, EngineError> {
        self.with_state(|state| {
            let mut rows: Vec<_> = state
                .records
                .iter()
                .filter(|r| {
                    r.employee_id == employee_id
                        && r.attendance_date >= start_date
                        && r.attendance_date <= end_date
                })
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.attendance_date);
            Ok(rows)
        })
    }

    async fn find_by_employee_date(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .records
                .iter()
                .find(|r| r.employee_id == employee_id && r.attendance_date == date)
                .cloned())
        })
    }

    async fn update_classification(
        &self,
        _db: &PgPool,
        id: AttendanceRecordId,
        classification: &HoursClassification,
        offset_hours_earned: Decimal,
    ) -> Result<u64, EngineError> {
        self.with_state(|state| {
            let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
                return Ok(0);
            };
            record.total_hours = Some(classification.total_hours);
            record.regular_hours = Some(classification.regular_hours);
            record.overtime_hours = Some(classification.overtime_hours);
            record.overtime_type = classification.overtime_type;
            record.is_night_overtime = classification.is_night_overtime;
            record.is_holiday_overtime = classification.is_holiday_overtime;
            record.offset_hours_earned = Some(offset_hours_earned);
            record.exceeds_daily_limit = classification.exceeds_daily_limit;
            record.exceeds_overtime_limit = classification.exceeds_overtime_limit;
            Ok(1)
        })
    }
}

#[async_trait]
impl TimesheetRepositoryTrait for FakeRepos {
    async fn find_by_id(&self, _db: &PgPool, id: TimesheetId) -> Result<Timesheet, EngineError> {
        self.with_state(|state| {
            state
                .timesheets
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound("timesheet".into()))
        })
    }

    async fn find_by_period(
        &self,
        _db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
        month: u32,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .timesheets
                .iter()
                .find(|t| t.employee_id == employee_id && t.year == year && t.month == month as i32)
                .cloned())
        })
    }

    async fn list_for_period(
        &self,
        _db: &PgPool,
        year: i32,
        month: u32,
    ) -> Result<Vec<Timesheet>, EngineError> {
        self.with_state(|state| {
            Ok(state
                .timesheets
                .iter()
                .filter(|t| t.year == year && t.month == month as i32)
                .cloned()
                .collect())
        })
    }

    async fn upsert_generated(
        &self,
        _db: &PgPool,
        item: &Timesheet,
    ) -> Result<Timesheet, EngineError> {
        self.with_state(|state| {
            match state.timesheets.iter_mut().find(|t| {
                t.employee_id == item.employee_id && t.year == item.year && t.month == item.month
            }) {
                Some(existing) if existing.status.is_regenerable() => {
                    let mut replacement = item.clone();
                    replacement.id = existing.id;
                    replacement.status = existing.status;
                    replacement.created_at = existing.created_at;
                    *existing = replacement.clone();
                    Ok(replacement)
                }
                Some(existing) => Ok(existing.clone()),
                None => {
                    state.timesheets.push(item.clone());
                    Ok(item.clone())
                }
            }
        })
    }

    async fn submit(
        &self,
        _db: &PgPool,
        id: TimesheetId,
        employee_notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            let Some(sheet) = state
                .timesheets
                .iter_mut()
                .find(|t| t.id == id && t.status.is_regenerable())
            else {
                return Ok(None);
            };
            sheet.status = TimesheetStatus::Submitted;
            sheet.submitted_at = Some(timestamp);
            sheet.employee_notes = employee_notes;
            sheet.updated_at = timestamp;
            Ok(Some(sheet.clone()))
        })
    }

    async fn manager_approve(
        &self,
        _db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            let Some(sheet) = state
                .timesheets
                .iter_mut()
                .find(|t| t.id == id && t.status == TimesheetStatus::Submitted)
            else {
                return Ok(None);
            };
            sheet.status = TimesheetStatus::ManagerApproved;
            sheet.manager_approved_by = Some(approver_id);
            sheet.manager_approved_at = Some(timestamp);
            sheet.manager_notes = notes.clone();
            sheet.updated_at = timestamp;
            Ok(Some(sheet.clone()))
        })
    }

    async fn hr_approve(
        &self,
        _db: &PgPool,
        id: TimesheetId,
        approver_id: EmployeeId,
        notes: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            let Some(sheet) = state
                .timesheets
                .iter_mut()
                .find(|t| t.id == id && t.status == TimesheetStatus::ManagerApproved)
            else {
                return Ok(None);
            };
            sheet.status = TimesheetStatus::HrApproved;
            sheet.hr_approved_by = Some(approver_id);
            sheet.hr_approved_at = Some(timestamp);
            sheet.hr_notes = notes;
            sheet.updated_at = timestamp;
            Ok(Some(sheet.clone()))
        })
    }

    async fn reject_from(
        &self,
        _db: &PgPool,
        id: TimesheetId,
        expected: TimesheetStatus,
        actor_id: EmployeeId,
        reason: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            let Some(sheet) = state
                .timesheets
                .iter_mut()
                .find(|t| t.id == id && t.status == expected)
            else {
                return Ok(None);
            };
            sheet.status = TimesheetStatus::Rejected;
            sheet.rejected_by = Some(actor_id);
            sheet.rejected_at = Some(timestamp);
            sheet.rejection_reason = Some(reason.to_string());
            sheet.updated_at = timestamp;
            Ok(Some(sheet.clone()))
        })
    }

    async fn mark_exported(
        &self,
        _db: &PgPool,
        id: TimesheetId,
        payroll_reference: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Timesheet>, EngineError> {
        self.with_state(|state| {
            let Some(sheet) = state
                .timesheets
                .iter_mut()
                .find(|t| t.id == id && t.status == TimesheetStatus::HrApproved)
            else {
                return Ok(None);
            };
            sheet.status = TimesheetStatus::Exported;
            sheet.exported_at = Some(timestamp);
            sheet.payroll_reference = payroll_reference;
            sheet.updated_at = timestamp;
            Ok(Some(sheet.clone()))
        })
    }
}

/// Directory fake with a fixed org chart.
#[derive(Default)]
pub struct FakeDirectory {
    pub managers: HashMap<EmployeeId, EmployeeId>,
    pub hr: HashSet<EmployeeId>,
    pub emails: HashMap<EmployeeId, String>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manager(mut self, employee: EmployeeId, manager: EmployeeId) -> Self {
        self.managers.insert(employee, manager);
        self
    }

    pub fn with_hr(mut self, actor: EmployeeId) -> Self {
        self.hr.insert(actor);
        self
    }

    pub fn with_email(mut self, employee: EmployeeId, email: &str) -> Self {
        self.emails.insert(employee, email.to_string());
        self
    }
}

#[async_trait]
impl EmployeeDirectory for FakeDirectory {
    async fn line_manager_of(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<EmployeeId>, EngineError> {
        Ok(self.managers.get(&employee_id).copied())
    }

    async fn is_hr(&self, actor_id: EmployeeId) -> Result<bool, EngineError> {
        Ok(self.hr.contains(&actor_id))
    }

    async fn email_of(&self, employee_id: EmployeeId) -> Result<Option<String>, EngineError> {
        Ok(self.emails.get(&employee_id).cloned())
    }
}

/// Notifier fake counting deliveries.
#[derive(Default)]
pub struct CountingNotifier {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn leave_requested(
        &self,
        request: &LeaveRequest,
        manager_email: &str,
    ) -> Result<(), EngineError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(format!("leave_requested:{}:{}", request.id, manager_email));
        Ok(())
    }

    async fn leave_decided(&self, request: &LeaveRequest) -> Result<(), EngineError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(format!("leave_decided:{}", request.id));
        Ok(())
    }

    async fn timesheet_status_changed(&self, timesheet: &Timesheet) -> Result<(), EngineError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(format!(
                "timesheet:{}:{}",
                timesheet.id,
                timesheet.status.as_str()
            ));
        Ok(())
    }
}

/// A finalized attendance record for aggregation tests.
pub fn present_day(employee_id: EmployeeId, day: NaiveDate) -> AttendanceRecord {
    let now = Utc::now();
    AttendanceRecord {
        id: AttendanceRecordId::new(),
        employee_id,
        attendance_date: day,
        clock_in: Some(utc(day.year(), day.month(), day.day(), 4, 0)),
        clock_out: Some(utc(day.year(), day.month(), day.day(), 13, 0)),
        clock_in_latitude: None,
        clock_in_longitude: None,
        clock_in_address: None,
        clock_out_latitude: None,
        clock_out_longitude: None,
        clock_out_address: None,
        work_location: WorkLocation::HeadOffice,
        work_type: WorkType::Office,
        status: AttendanceStatus::Present,
        total_hours: Some(Decimal::from(8)),
        regular_hours: Some(Decimal::from(8)),
        overtime_hours: None,
        overtime_type: OvertimeType::None,
        is_night_overtime: false,
        is_holiday_overtime: false,
        overtime_amount: None,
        offset_hours_earned: None,
        food_allowance_eligible: false,
        food_allowance_amount: None,
        is_late: false,
        late_minutes: None,
        is_early_departure: false,
        early_departure_minutes: None,
        exceeds_daily_limit: false,
        exceeds_overtime_limit: false,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
