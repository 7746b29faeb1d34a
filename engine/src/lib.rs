//! Attendance-leave reconciliation engine.
//!
//! Turns daily attendance rows, leave requests and public-holiday reference
//! data into payroll figures: leave balances, overtime aggregates and
//! monthly timesheets, plus the approval state machines around them.
//!
//! The engine is storage-backed (PostgreSQL via sqlx) and collaborator-free:
//! the employee directory and the notification channel are reached through
//! the traits in [`services::ports`], injected at service construction.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;
pub mod validation;
