//! Leave balance repository.
//!
//! Balances are read-mostly: the approval path increments `pending`
//! inside the leave-request transaction, and an external batch moves
//! `pending` to `used` once the leave elapses. This repository covers
//! reads, administrative seeding and HR adjustments.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::leave::LeaveType;
use crate::models::leave_balance::LeaveBalance;
use crate::types::EmployeeId;

const COLUMNS: &str = "id, employee_id, year, leave_type, entitlement, carried_forward, used, \
     pending, adjustment, adjustment_reason, offset_days_used, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveBalanceRepositoryTrait: Send + Sync {
    /// Balance for one (employee, type, year) key, if seeded.
    async fn find(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<Option<LeaveBalance>, EngineError>;

    /// All balances of an employee for a year.
    async fn list_for_year(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, EngineError>;

    /// Administrative seeding. Returns false when the key already exists
    /// (existing rows are never overwritten).
    async fn seed(&self, db: &PgPool, balance: &LeaveBalance) -> Result<bool, EngineError>;

    /// HR adjustment with a mandatory reason. Returns rows touched.
    async fn adjust(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        delta: Decimal,
        reason: &str,
    ) -> Result<u64, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveBalanceRepository;

impl LeaveBalanceRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LeaveBalanceRepositoryTrait for LeaveBalanceRepository {
    async fn find(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<Option<LeaveBalance>, EngineError> {
        let query = format!(
            "SELECT {} FROM leave_balances \
             WHERE employee_id = $1 AND leave_type = $2 AND year = $3",
            COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveBalance>(&query)
            .bind(employee_id)
            .bind(leave_type)
            .bind(year)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list_for_year(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, EngineError> {
        let query = format!(
            "SELECT {} FROM leave_balances \
             WHERE employee_id = $1 AND year = $2 ORDER BY leave_type",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveBalance>(&query)
            .bind(employee_id)
            .bind(year)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn seed(&self, db: &PgPool, balance: &LeaveBalance) -> Result<bool, EngineError> {
        let query = format!(
            "INSERT INTO leave_balances ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (employee_id, year, leave_type) DO NOTHING",
            COLUMNS
        );
        let result = sqlx::query(&query)
            .bind(balance.id)
            .bind(balance.employee_id)
            .bind(balance.year)
            .bind(balance.leave_type)
            .bind(balance.entitlement)
            .bind(balance.carried_forward)
            .bind(balance.used)
            .bind(balance.pending)
            .bind(balance.adjustment)
            .bind(&balance.adjustment_reason)
            .bind(balance.offset_days_used)
            .bind(balance.created_at)
            .bind(balance.updated_at)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        leave_type: LeaveType,
        year: i32,
        delta: Decimal,
        reason: &str,
    ) -> Result<u64, EngineError> {
        let result = sqlx::query(
            "UPDATE leave_balances \
             SET adjustment = adjustment + $1, adjustment_reason = $2, updated_at = NOW() \
             WHERE employee_id = $3 AND leave_type = $4 AND year = $5",
        )
        .bind(delta)
        .bind(reason)
        .bind(employee_id)
        .bind(leave_type)
        .bind(year)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
