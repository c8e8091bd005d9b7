use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::application::{LeaveApplication, NewLeaveApplication, ReviewTransition};
use super::authorization::VisibilityScope;
use super::balance::{BalanceKey, LeaveBalance};
use super::domain::{LeaveId, LeaveStatus, LeaveType, Role, UserId};

/// Filter handed to [`LeaveApplicationRepository::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveQuery {
    pub scope: VisibilityScope,
    pub status: Option<LeaveStatus>,
}

impl LeaveQuery {
    pub fn new(scope: VisibilityScope) -> Self {
        Self {
            scope,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<LeaveStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, application: &LeaveApplication) -> bool {
        self.scope.matches(application)
            && self
                .status
                .map_or(true, |status| application.status() == status)
    }
}

/// What a user release removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub applications: usize,
    pub balances: usize,
}

/// Storage for applications. `remove_pending` and `commit_review` are conditional on the
/// record still being pending and must be atomic with respect to each other.
pub trait LeaveApplicationRepository: Send + Sync {
    /// Persist a new pending application and assign its id.
    fn insert(&self, application: NewLeaveApplication) -> Result<LeaveApplication, RepositoryError>;
    fn fetch(&self, id: LeaveId) -> Result<Option<LeaveApplication>, RepositoryError>;
    /// Matching applications, newest applied first.
    fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveApplication>, RepositoryError>;
    /// Delete the application if it is still pending; `StatusConflict` otherwise.
    fn remove_pending(&self, id: LeaveId) -> Result<LeaveApplication, RepositoryError>;
    /// Apply the status transition and its optional balance debit as one unit. Nothing is
    /// written when the application is no longer pending.
    fn commit_review(&self, transition: &ReviewTransition)
        -> Result<LeaveApplication, RepositoryError>;
    /// Drop every application and balance owned by `user`, refusing while any are pending.
    fn purge_applicant(&self, user: &UserId) -> Result<PurgeReport, RepositoryError>;
}

/// Per-(user, year) balance records.
pub trait LeaveBalanceStore: Send + Sync {
    /// Return the balance, creating it from the store's allowance if absent. Concurrent
    /// first access for one key yields a single record.
    fn get_or_create(&self, key: &BalanceKey) -> Result<LeaveBalance, RepositoryError>;
    /// The stored balance, or the opening balance it would start with. Never writes.
    fn peek(&self, key: &BalanceKey) -> Result<LeaveBalance, RepositoryError>;
    /// Deduct `days`, floored at zero, and persist.
    fn debit(
        &self,
        key: &BalanceKey,
        leave_type: LeaveType,
        days: u32,
    ) -> Result<LeaveBalance, RepositoryError>;
}

/// A backend holding both applications and balances, so reviews can commit atomically.
pub trait LeaveStore: LeaveApplicationRepository + LeaveBalanceStore {}

impl<T> LeaveStore for T where T: LeaveApplicationRepository + LeaveBalanceStore {}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record is already {current}")]
    StatusConflict { current: LeaveStatus },
    #[error("user still owns {count} pending application(s)")]
    PendingApplications { count: usize },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail or chat adapters). Implementations must not block;
/// the workflow ignores their failures.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Review outcome addressed to the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewNotice {
    pub applicant_name: String,
    pub applicant_email: String,
    pub leave_id: LeaveId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub status: LeaveStatus,
    pub reviewer_name: String,
    pub reviewer_role: Role,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewNotice {
    /// Build the notice for a reviewed application; `None` while it is still pending.
    pub fn for_application(application: &LeaveApplication) -> Option<Self> {
        let stamp = application.review()?;
        Some(Self {
            applicant_name: application.applicant().display_name().to_string(),
            applicant_email: application.applicant().email.clone(),
            leave_id: application.id(),
            leave_type: application.leave_type(),
            start_date: application.start_date(),
            end_date: application.end_date(),
            total_days: application.total_days(),
            status: application.status(),
            reviewer_name: stamp.reviewer.name.clone(),
            reviewer_role: stamp.reviewer.role,
            comment: stamp.comment.clone(),
            reviewed_at: stamp.reviewed_at,
        })
    }

    pub fn subject(&self) -> String {
        format!(
            "[LeaveMS] Leave Application {} - {}",
            self.status.label().to_ascii_uppercase(),
            self.leave_id
        )
    }

    pub fn body(&self) -> String {
        format!(
            "Dear {name},\n\n\
             Your {kind} application ({id}) from {start} to {end} ({days} working day(s)) \
             has been {status}.\n\n\
             Reviewed by : {reviewer} [{role}]\n\
             Comment     : {comment}\n\
             Review Date : {reviewed}\n\n\
             Regards,\nLeave Management System",
            name = self.applicant_name,
            kind = self.leave_type.display_name(),
            id = self.leave_id,
            start = self.start_date,
            end = self.end_date,
            days = self.total_days,
            status = self.status.label().to_ascii_uppercase(),
            reviewer = self.reviewer_name,
            role = self.reviewer_role.display_name(),
            comment = self.comment.as_deref().unwrap_or("No comment provided."),
            reviewed = self.reviewed_at.format("%d %b %Y, %I:%M %p"),
        )
    }
}
