//! Leave request validation, creation and approval.
//!
//! Validation order is fixed: date range, overlap, balance. The chargeable
//! figure is raw calendar days (holidays are NOT subtracted); only the
//! separate [`LeaveService::working_days`] reporting utility is
//! holiday-aware. That asymmetry mirrors the observed payroll behavior and
//! is preserved deliberately.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::Validate;

use crate::db::DbPool;
use crate::error::EngineError;
use crate::models::holiday::holiday_days_within;
use crate::models::leave::{CreateLeaveRequest, LeaveRequest, LeaveType};
use crate::models::leave_balance::LeaveBalance;
use crate::repositories::{
    HolidayRepository, HolidayRepositoryTrait, LeaveBalanceRepository,
    LeaveBalanceRepositoryTrait, LeaveRequestRepository, LeaveRequestRepositoryTrait,
};
use crate::services::ports::{EmployeeDirectory, Notifier};
use crate::types::{EmployeeId, LeaveRequestId};

/// Days charged against the balance for a request.
///
/// Half-days are always 0.5 regardless of the date span; otherwise the
/// count is inclusive calendar days.
pub fn chargeable_days(
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_half_day: bool,
) -> Result<Decimal, EngineError> {
    if end_date < start_date {
        return Err(EngineError::InvalidDateRange);
    }
    if is_half_day {
        return Ok(dec!(0.5));
    }
    Ok(Decimal::from((end_date - start_date).num_days() + 1))
}

pub struct LeaveService<
    R = LeaveRequestRepository,
    B = LeaveBalanceRepository,
    H = HolidayRepository,
> {
    db: DbPool,
    requests: R,
    balances: B,
    holidays: H,
    directory: Arc<dyn EmployeeDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl LeaveService {
    pub fn new(db: DbPool, directory: Arc<dyn EmployeeDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_parts(
            db,
            LeaveRequestRepository::new(),
            LeaveBalanceRepository::new(),
            HolidayRepository::new(),
            directory,
            notifier,
        )
    }
}

impl<R, B, H> LeaveService<R, B, H>
where
    R: LeaveRequestRepositoryTrait,
    B: LeaveBalanceRepositoryTrait,
    H: HolidayRepositoryTrait,
{
    pub fn with_parts(
        db: DbPool,
        requests: R,
        balances: B,
        holidays: H,
        directory: Arc<dyn EmployeeDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            requests,
            balances,
            holidays,
            directory,
            notifier,
        }
    }

    /// Run the full rule chain for a prospective request and return the
    /// chargeable days. No side effects on failure.
    pub async fn validate_request(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_half_day: bool,
    ) -> Result<Decimal, EngineError> {
        let days = chargeable_days(start_date, end_date, is_half_day)?;

        if let Some(conflict) = self
            .requests
            .find_overlapping(&self.db, employee_id, start_date, end_date)
            .await?
        {
            return Err(EngineError::OverlappingRequest {
                conflicting_id: conflict.id,
            });
        }

        if leave_type.requires_balance() {
            let available = self
                .balances
                .find(&self.db, employee_id, leave_type, start_date.year())
                .await?
                .map(|balance| balance.available())
                .unwrap_or(Decimal::ZERO);
            if available < days {
                return Err(EngineError::InsufficientBalance {
                    available,
                    requested: days,
                });
            }
        }

        Ok(days)
    }

    /// Validate and persist a pending request, then notify the manager.
    ///
    /// The insert re-checks overlap under a per-employee lock, so two
    /// concurrent overlapping submissions cannot both succeed. Notification
    /// failure is logged and does not fail the creation.
    pub async fn create_request(
        &self,
        payload: CreateLeaveRequest,
    ) -> Result<LeaveRequest, EngineError> {
        payload.validate()?;

        let days = self
            .validate_request(
                payload.employee_id,
                payload.leave_type,
                payload.start_date,
                payload.end_date,
                payload.is_half_day,
            )
            .await?;

        let mut request = LeaveRequest::new(payload, days);

        let manager_email = match self.directory.line_manager_of(request.employee_id).await? {
            Some(manager_id) => self.directory.email_of(manager_id).await?,
            None => None,
        };
        request.manager_email = manager_email.clone();

        let mut created = self.requests.insert_pending(&self.db, &request).await?;
        tracing::info!(
            request_id = %created.id,
            employee_id = %created.employee_id,
            leave_type = %created.leave_type,
            total_days = %created.total_days,
            "leave request created"
        );

        if let Some(email) = manager_email {
            match self.notifier.leave_requested(&created, &email).await {
                Ok(()) => {
                    let now = Utc::now();
                    match self
                        .requests
                        .mark_manager_notified(&self.db, created.id, &email, now)
                        .await
                    {
                        Ok(_) => {
                            created.manager_email = Some(email);
                            created.manager_notified = true;
                            created.notification_sent_at = Some(now);
                        }
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                request_id = %created.id,
                                "failed to record manager notification"
                            );
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        request_id = %created.id,
                        "manager notification failed"
                    );
                }
            }
        }

        Ok(created)
    }

    /// Approve or reject a pending request.
    ///
    /// Approval reserves the days on the balance in the same transaction as
    /// the status flip. A request that is no longer pending yields
    /// `InvalidStateTransition` regardless of call order.
    pub async fn decide(
        &self,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        approve: bool,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, EngineError> {
        // Existence first, so unknown ids are NotFound rather than a
        // transition failure.
        self.requests.find_by_id(&self.db, id).await?;

        let now = Utc::now();
        let transitioned = if approve {
            self.requests
                .approve_and_reserve(&self.db, id, approver_id, now)
                .await?
        } else {
            self.requests
                .reject(&self.db, id, approver_id, reason.map(str::to_string), now)
                .await?
        };

        if transitioned == 0 {
            let current = self.requests.find_by_id(&self.db, id).await?;
            return Err(EngineError::InvalidStateTransition(format!(
                "leave request is {}",
                current.status.as_str()
            )));
        }

        let updated = self.requests.find_by_id(&self.db, id).await?;
        tracing::info!(
            request_id = %updated.id,
            status = updated.status.as_str(),
            approver_id = %approver_id,
            "leave request decided"
        );

        if let Err(err) = self.notifier.leave_decided(&updated).await {
            tracing::warn!(error = %err, request_id = %updated.id, "decision notification failed");
        }

        Ok(updated)
    }

    /// Cancel a pending request; owner only.
    pub async fn cancel(
        &self,
        id: LeaveRequestId,
        employee_id: EmployeeId,
    ) -> Result<LeaveRequest, EngineError> {
        self.requests.find_by_id(&self.db, id).await?;

        let transitioned = self
            .requests
            .cancel(&self.db, id, employee_id, Utc::now())
            .await?;
        if transitioned == 0 {
            return Err(EngineError::InvalidStateTransition(
                "only the owner may cancel a pending request".into(),
            ));
        }

        self.requests.find_by_id(&self.db, id).await
    }

    /// All requests of an employee, newest first.
    pub async fn requests_for(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        self.requests.find_by_employee(&self.db, employee_id).await
    }

    /// Working days in [start, end] for display/reporting.
    ///
    /// Unlike [`chargeable_days`], this subtracts intersected holiday days
    /// when asked to, floored at zero.
    pub async fn working_days(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_holidays: bool,
    ) -> Result<Decimal, EngineError> {
        if end_date < start_date {
            return Err(EngineError::InvalidDateRange);
        }
        let total = (end_date - start_date).num_days() + 1;
        if !exclude_holidays {
            return Ok(Decimal::from(total));
        }

        let holidays = self
            .holidays
            .find_in_range(&self.db, start_date, end_date)
            .await?;
        let holiday_days = holiday_days_within(&holidays, start_date, end_date);
        Ok(Decimal::from((total - holiday_days).max(0)))
    }

    /// All balances of an employee for a year.
    pub async fn balances(
        &self,
        employee_id: EmployeeId,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, EngineError> {
        self.balances.list_for_year(&self.db, employee_id, year).await
    }

    /// Administrative seeding of a balance row. Returns false when the
    /// (employee, year, type) key already exists.
    pub async fn seed_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        entitlement: Decimal,
        carried_forward: Decimal,
    ) -> Result<bool, EngineError> {
        let mut balance = LeaveBalance::zeroed(employee_id, year, leave_type);
        balance.entitlement = entitlement;
        balance.carried_forward = carried_forward;
        self.balances.seed(&self.db, &balance).await
    }

    /// HR balance adjustment with a mandatory reason.
    pub async fn adjust_balance(
        &self,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        delta: Decimal,
        reason: &str,
    ) -> Result<(), EngineError> {
        let touched = self
            .balances
            .adjust(&self.db, employee_id, leave_type, year, delta, reason)
            .await?;
        if touched == 0 {
            return Err(EngineError::NotFound("leave balance".into()));
        }
        Ok(())
    }
}
