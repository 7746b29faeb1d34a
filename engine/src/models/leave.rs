use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::EngineError;
use crate::types::{EmployeeId, LeaveRequestId};

/// Leave types recognised by the engine (UAE labor-law derived set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Compassionate,
    Hajj,
    Unpaid,
    Study,
    Marriage,
    Emergency,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Compassionate => "compassionate",
            LeaveType::Hajj => "hajj",
            LeaveType::Unpaid => "unpaid",
            LeaveType::Study => "study",
            LeaveType::Marriage => "marriage",
            LeaveType::Emergency => "emergency",
        }
    }

    /// Unpaid leave is the only type that bypasses the balance check.
    pub fn requires_balance(&self) -> bool {
        !matches!(self, LeaveType::Unpaid)
    }
}

impl FromStr for LeaveType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annual" => Ok(LeaveType::Annual),
            "sick" => Ok(LeaveType::Sick),
            "maternity" => Ok(LeaveType::Maternity),
            "paternity" => Ok(LeaveType::Paternity),
            "compassionate" => Ok(LeaveType::Compassionate),
            "hajj" => Ok(LeaveType::Hajj),
            "unpaid" => Ok(LeaveType::Unpaid),
            "study" => Ok(LeaveType::Study),
            "marriage" => Ok(LeaveType::Marriage),
            "emergency" => Ok(LeaveType::Emergency),
            other => Err(EngineError::InvalidLeaveType(other.to_string())),
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leave request workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl Default for LeaveStatus {
    fn default() -> Self {
        LeaveStatus::Pending
    }
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
            LeaveStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HalfDayType {
    FirstHalf,
    SecondHalf,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    /// Chargeable days, computed once at creation and immutable thereafter.
    pub total_days: Decimal,
    pub reason: Option<String>,
    pub document_url: Option<String>,
    pub status: LeaveStatus,
    pub approved_by: Option<EmployeeId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub manager_email: Option<String>,
    pub manager_notified: bool,
    pub notification_sent_at: Option<DateTime<Utc>>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLeaveRequest {
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_half_day: bool,
    #[serde(default)]
    pub half_day_type: Option<HalfDayType>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub reason: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub emergency_phone: Option<String>,
}

impl LeaveRequest {
    pub fn new(payload: CreateLeaveRequest, total_days: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: LeaveRequestId::new(),
            employee_id: payload.employee_id,
            leave_type: payload.leave_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            is_half_day: payload.is_half_day,
            half_day_type: payload.half_day_type,
            total_days,
            reason: payload.reason,
            document_url: None,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            manager_email: None,
            manager_notified: false,
            notification_sent_at: None,
            emergency_contact: payload.emergency_contact,
            emergency_phone: payload.emergency_phone,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, LeaveStatus::Pending)
    }

    /// Inclusive interval intersection with [start, end].
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest::new(
            CreateLeaveRequest {
                employee_id: EmployeeId::new(),
                leave_type: LeaveType::Annual,
                start_date: start,
                end_date: end,
                is_half_day: false,
                half_day_type: None,
                reason: None,
                emergency_contact: None,
                emergency_phone: None,
            },
            dec!(5),
        )
    }

    #[test]
    fn leave_type_and_status_serde_snake_case() {
        let lt: LeaveType = serde_json::from_str("\"compassionate\"").unwrap();
        assert!(matches!(lt, LeaveType::Compassionate));
        let vlt = serde_json::to_value(LeaveType::Hajj).unwrap();
        assert_eq!(vlt, serde_json::json!("hajj"));

        let ls: LeaveStatus = serde_json::from_str("\"completed\"").unwrap();
        assert!(matches!(ls, LeaveStatus::Completed));
        let vls = serde_json::to_value(LeaveStatus::Cancelled).unwrap();
        assert_eq!(vls, serde_json::json!("cancelled"));
    }

    #[test]
    fn unknown_leave_type_is_rejected_at_parse() {
        let err = "sabbatical".parse::<LeaveType>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidLeaveType(t) if t == "sabbatical"));
    }

    #[test]
    fn unpaid_is_the_only_type_without_balance_check() {
        assert!(!LeaveType::Unpaid.requires_balance());
        assert!(LeaveType::Annual.requires_balance());
        assert!(LeaveType::Sick.requires_balance());
    }

    #[test]
    fn overlaps_is_symmetric_on_touching_ranges() {
        let existing = request(date(2026, 1, 5), date(2026, 1, 10));
        assert!(existing.overlaps(date(2026, 1, 8), date(2026, 1, 12)));
        assert!(existing.overlaps(date(2026, 1, 10), date(2026, 1, 10)));
        assert!(!existing.overlaps(date(2026, 1, 11), date(2026, 1, 12)));
        assert!(!existing.overlaps(date(2026, 1, 1), date(2026, 1, 4)));
    }

    #[test]
    fn new_request_starts_pending() {
        let request = request(date(2026, 3, 1), date(2026, 3, 2));
        assert!(request.is_pending());
        assert_eq!(request.total_days, dec!(5));
        assert!(request.approved_by.is_none());
    }
}
