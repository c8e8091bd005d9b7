//! Leave-application workflow engine.
//!
//! Employees and managers file leave requests that move through a fixed approval chain:
//! managers review employees of their own department, admins review managers. Approval
//! debits the applicant's yearly balance in the same commit as the status change.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
