//! Leave request repository.
//!
//! Creation and approval are the two write paths with concurrency
//! obligations (per-employee serialization and single-shot state
//! transitions); both run as single transactions here so the service
//! layer never sees a half-applied mutation.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::PgPool;

use crate::error::EngineError;
use crate::models::leave::{LeaveRequest, LeaveStatus};
use crate::repositories::transaction::{
    begin_transaction, commit_transaction, rollback_transaction,
};
use crate::types::{EmployeeId, LeaveBalanceId, LeaveRequestId};

const COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, is_half_day, \
     half_day_type, total_days, reason, document_url, status, approved_by, approved_at, \
     rejection_reason, manager_email, manager_notified, notification_sent_at, \
     emergency_contact, emergency_phone, created_at, updated_at";

/// Repository trait for LeaveRequest operations.
///
/// Designed to be mocked with mockall in service tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveRequestRepositoryTrait: Send + Sync {
    /// Find a leave request by ID.
    async fn find_by_id(&self, db: &PgPool, id: LeaveRequestId)
        -> Result<LeaveRequest, EngineError>;

    /// All requests for an employee, newest first.
    async fn find_by_employee(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, EngineError>;

    /// First pending/approved request intersecting [start, end], if any.
    async fn find_overlapping(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<LeaveRequest>, EngineError>;

    /// Approved requests intersecting [start, end] (timesheet aggregation).
    async fn find_approved_overlapping(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, EngineError>;

    /// Insert a pending request, serialized per employee.
    ///
    /// Takes an advisory transaction lock on the employee and re-checks
    /// overlap under it: of two concurrent overlapping submissions exactly
    /// one commits, the other gets `OverlappingRequest`.
    async fn insert_pending(
        &self,
        db: &PgPool,
        item: &LeaveRequest,
    ) -> Result<LeaveRequest, EngineError>;

    /// Approve a pending request and reserve the days on the balance.
    ///
    /// The status flip and the `pending` increment commit together; a
    /// missing balance row is created zeroed. Returns the number of
    /// requests transitioned (0 when the request was not pending).
    async fn approve_and_reserve(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError>;

    /// Reject a pending request. Returns rows transitioned.
    async fn reject(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError>;

    /// Cancel a pending request, owner only. Returns rows transitioned.
    async fn cancel(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        employee_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError>;

    /// Record that the manager notification went out.
    async fn mark_manager_notified(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        manager_email: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError>;
}

/// Concrete sqlx/Postgres implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveRequestRepository;

impl LeaveRequestRepository {
    pub fn new() -> Self {
        Self
    }
}

/// Advisory-lock key derived from the employee UUID: all writers touching
/// one employee's requests contend on the same key.
fn employee_lock_key(employee_id: EmployeeId) -> i64 {
    let uuid: uuid::Uuid = employee_id.into();
    let bytes = uuid.as_bytes();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&bytes[..8]);
    i64::from_le_bytes(prefix)
}

#[async_trait]
impl LeaveRequestRepositoryTrait for LeaveRequestRepository {
    async fn find_by_id(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, EngineError> {
        let query = format!("SELECT {} FROM leave_requests WHERE id = $1", COLUMNS);
        sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("leave request".into()))
    }

    async fn find_by_employee(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        let query = format!(
            "SELECT {} FROM leave_requests WHERE employee_id = $1 ORDER BY created_at DESC",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(employee_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_overlapping(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<LeaveRequest>, EngineError> {
        let query = format!(
            "SELECT {} FROM leave_requests \
             WHERE employee_id = $1 AND status IN ('pending', 'approved') \
               AND start_date <= $3 AND end_date >= $2 \
             ORDER BY start_date LIMIT 1",
            COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(employee_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_approved_overlapping(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, EngineError> {
        let query = format!(
            "SELECT {} FROM leave_requests \
             WHERE employee_id = $1 AND status = 'approved' \
               AND start_date <= $3 AND end_date >= $2 \
             ORDER BY start_date",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(employee_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn insert_pending(
        &self,
        db: &PgPool,
        item: &LeaveRequest,
    ) -> Result<LeaveRequest, EngineError> {
        let mut tx = begin_transaction(db).await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(employee_lock_key(item.employee_id))
            .execute(&mut *tx)
            .await?;

        // Overlap re-check under the lock closes the submit race.
        let conflicting: Option<LeaveRequestId> = sqlx::query_scalar(
            "SELECT id FROM leave_requests \
             WHERE employee_id = $1 AND status IN ('pending', 'approved') \
               AND start_date <= $3 AND end_date >= $2 \
             ORDER BY start_date LIMIT 1",
        )
        .bind(item.employee_id)
        .bind(item.start_date)
        .bind(item.end_date)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(conflicting_id) = conflicting {
            rollback_transaction(tx).await?;
            return Err(EngineError::OverlappingRequest { conflicting_id });
        }

        let query = format!(
            "INSERT INTO leave_requests ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21) \
             RETURNING {}",
            COLUMNS, COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(item.id)
            .bind(item.employee_id)
            .bind(item.leave_type)
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(item.is_half_day)
            .bind(item.half_day_type)
            .bind(item.total_days)
            .bind(&item.reason)
            .bind(&item.document_url)
            .bind(item.status)
            .bind(item.approved_by)
            .bind(item.approved_at)
            .bind(&item.rejection_reason)
            .bind(&item.manager_email)
            .bind(item.manager_notified)
            .bind(item.notification_sent_at)
            .bind(&item.emergency_contact)
            .bind(&item.emergency_phone)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        commit_transaction(tx).await?;
        Ok(row)
    }

    async fn approve_and_reserve(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let mut tx = begin_transaction(db).await?;

        let approved = sqlx::query_as::<_, LeaveRequest>(&format!(
            "UPDATE leave_requests \
             SET status = $1, approved_by = $2, approved_at = $3, updated_at = $3 \
             WHERE id = $4 AND status = 'pending' \
             RETURNING {}",
            COLUMNS
        ))
        .bind(LeaveStatus::Approved)
        .bind(approver_id)
        .bind(timestamp)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = approved else {
            rollback_transaction(tx).await?;
            return Ok(0);
        };

        // Reserve the days for the year the leave starts in. The upsert
        // creates a zeroed row when none exists, so approval never fails
        // on a missing balance.
        sqlx::query(
            "INSERT INTO leave_balances \
                 (id, employee_id, year, leave_type, entitlement, carried_forward, used, \
                  pending, adjustment, adjustment_reason, offset_days_used, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 0, 0, 0, $5, 0, NULL, 0, $6, $6) \
             ON CONFLICT (employee_id, year, leave_type) \
             DO UPDATE SET pending = leave_balances.pending + EXCLUDED.pending, updated_at = $6",
        )
        .bind(LeaveBalanceId::new())
        .bind(request.employee_id)
        .bind(request.start_date.year())
        .bind(request.leave_type)
        .bind(request.total_days)
        .bind(timestamp)
        .execute(&mut *tx)
        .await?;

        commit_transaction(tx).await?;
        Ok(1)
    }

    async fn reject(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        approver_id: EmployeeId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let result = sqlx::query(
            "UPDATE leave_requests \
             SET status = $1, approved_by = $2, rejection_reason = $3, updated_at = $4 \
             WHERE id = $5 AND status = 'pending'",
        )
        .bind(LeaveStatus::Rejected)
        .bind(approver_id)
        .bind(reason)
        .bind(timestamp)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn cancel(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        employee_id: EmployeeId,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let result = sqlx::query(
            "UPDATE leave_requests SET status = $1, updated_at = $2 \
             WHERE id = $3 AND employee_id = $4 AND status = 'pending'",
        )
        .bind(LeaveStatus::Cancelled)
        .bind(timestamp)
        .bind(id)
        .bind(employee_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_manager_notified(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
        manager_email: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let result = sqlx::query(
            "UPDATE leave_requests \
             SET manager_email = $1, manager_notified = TRUE, notification_sent_at = $2, \
                 updated_at = $2 \
             WHERE id = $3",
        )
        .bind(manager_email)
        .bind(timestamp)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
