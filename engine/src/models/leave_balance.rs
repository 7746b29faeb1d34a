use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::leave::LeaveType;
use crate::types::{EmployeeId, LeaveBalanceId};

/// Per-employee, per-year, per-type leave balance.
///
/// The available quantity is always derived, never stored:
/// `entitlement + carried_forward + adjustment - used - pending`.
/// Offset days (compensatory leave earned from overtime) are tracked
/// separately and do not enter the formula directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaveBalance {
    pub id: LeaveBalanceId,
    pub employee_id: EmployeeId,
    pub year: i32,
    pub leave_type: LeaveType,
    pub entitlement: Decimal,
    pub carried_forward: Decimal,
    pub used: Decimal,
    pub pending: Decimal,
    pub adjustment: Decimal,
    pub adjustment_reason: Option<String>,
    pub offset_days_used: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    /// A zeroed balance row, as created implicitly on first approval.
    pub fn zeroed(employee_id: EmployeeId, year: i32, leave_type: LeaveType) -> Self {
        let now = Utc::now();
        Self {
            id: LeaveBalanceId::new(),
            employee_id,
            year,
            leave_type,
            entitlement: Decimal::ZERO,
            carried_forward: Decimal::ZERO,
            used: Decimal::ZERO,
            pending: Decimal::ZERO,
            adjustment: Decimal::ZERO,
            adjustment_reason: None,
            offset_days_used: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn available(&self) -> Decimal {
        self.entitlement + self.carried_forward + self.adjustment - self.used - self.pending
    }
}
