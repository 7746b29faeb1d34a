//! Collaborator seams.
//!
//! The employee directory and the notification channel live outside this
//! engine. Services hold them as trait objects injected at construction;
//! notification failures are logged and never roll back engine state.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::models::leave::LeaveRequest;
use crate::models::timesheet::Timesheet;
use crate::types::EmployeeId;

/// Resolves reporting lines and roles. Backed by the employee service of
/// the surrounding HR system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Direct line manager of an employee, if one is assigned.
    async fn line_manager_of(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<EmployeeId>, EngineError>;

    /// Whether the actor holds the HR/admin override role.
    async fn is_hr(&self, actor_id: EmployeeId) -> Result<bool, EngineError>;

    /// Notification address of an employee.
    async fn email_of(&self, employee_id: EmployeeId) -> Result<Option<String>, EngineError>;
}

/// Outbound notification channel (mail, push, ...). Fire-and-forget from
/// the engine's perspective.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new leave request awaits the manager's decision.
    async fn leave_requested(
        &self,
        request: &LeaveRequest,
        manager_email: &str,
    ) -> Result<(), EngineError>;

    /// A leave request was approved or rejected.
    async fn leave_decided(&self, request: &LeaveRequest) -> Result<(), EngineError>;

    /// A timesheet moved through its approval workflow.
    async fn timesheet_status_changed(&self, timesheet: &Timesheet) -> Result<(), EngineError>;
}

/// Notifier that drops everything; for hosts without a delivery channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn leave_requested(
        &self,
        _request: &LeaveRequest,
        _manager_email: &str,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    async fn leave_decided(&self, _request: &LeaveRequest) -> Result<(), EngineError> {
        Ok(())
    }

    async fn timesheet_status_changed(&self, _timesheet: &Timesheet) -> Result<(), EngineError> {
        Ok(())
    }
}
