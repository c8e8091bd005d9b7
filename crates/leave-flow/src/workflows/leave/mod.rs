//! Leave-application workflow: submission sizing, role-scoped review, and balance accounting.
//!
//! Applications start `pending` and move exactly once to `approved` or `rejected`. Employees
//! are reviewed by a manager of their own department, managers by an admin. Approval debits
//! the applicant's yearly balance in the same store commit as the status change, and the
//! applicant is notified on a best-effort basis afterwards.

pub mod application;
pub mod authorization;
pub mod balance;
pub mod calendar;
pub mod clock;
pub mod coordinator;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use application::{
    LeaveApplication, LeavePolicy, LeaveView, NewLeaveApplication, ReviewStamp,
    ReviewTransition, TransitionError, ValidationError,
};
pub use authorization::{AuthorizationPolicy, VisibilityScope};
pub use balance::{BalanceDebit, BalanceKey, LeaveAllowance, LeaveBalance};
pub use calendar::working_days;
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::ReviewCoordinator;
pub use domain::{
    Actor, LeaveId, LeaveRequest, LeaveStatus, LeaveType, ReviewDecision, ReviewerRef, Role,
    UserId,
};
pub use memory::InMemoryLeaveStore;
pub use repository::{
    LeaveApplicationRepository, LeaveBalanceStore, LeaveQuery, LeaveStore, NotificationError,
    NotificationSink, PurgeReport, RepositoryError, ReviewNotice,
};
pub use router::{actor_from_headers, leave_router, ActorHeaders};
pub use service::{LeaveServiceError, LeaveWorkflowService, StatusSummary};
