use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::application::{
    LeaveApplication, LeavePolicy, NewLeaveApplication, TransitionError, ValidationError,
};
use super::authorization::{AuthorizationPolicy, VisibilityScope};
use super::balance::{BalanceKey, LeaveBalance};
use super::clock::{Clock, SystemClock};
use super::coordinator::ReviewCoordinator;
use super::domain::{
    Actor, LeaveId, LeaveRequest, LeaveStatus, LeaveType, ReviewDecision, UserId,
};
use super::repository::{LeaveQuery, LeaveStore, NotificationSink, PurgeReport, RepositoryError};

/// Facade over the leave workflow: submission, withdrawal, review, and scoped reads.
pub struct LeaveWorkflowService<S, N> {
    store: Arc<S>,
    policy: AuthorizationPolicy,
    leave_policy: LeavePolicy,
    clock: Arc<dyn Clock>,
    coordinator: ReviewCoordinator<S, N>,
}

impl<S, N> LeaveWorkflowService<S, N>
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, leave_policy: LeavePolicy) -> Self {
        Self::with_clock(store, notifier, leave_policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        leave_policy: LeavePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let coordinator = ReviewCoordinator::new(store.clone(), notifier, clock.clone());
        Self {
            store,
            policy: AuthorizationPolicy::new(),
            leave_policy,
            clock,
            coordinator,
        }
    }

    /// File a new pending application after validating its shape and the applicant's
    /// remaining balance for the requested type.
    pub fn submit(
        &self,
        applicant: &Actor,
        request: LeaveRequest,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        if !self.policy.can_apply(applicant) {
            return Err(LeaveServiceError::Authorization(
                "admins cannot apply for leave".to_string(),
            ));
        }

        self.leave_policy.validate(&request, self.clock.today())?;

        let draft = NewLeaveApplication::sized(applicant.clone(), request, self.clock.now());
        let balance = self.store.get_or_create(&BalanceKey::new(
            applicant.id.clone(),
            self.clock.balance_year(),
        ))?;
        let available = balance.available(draft.leave_type());
        if draft.total_days() > available {
            return Err(LeaveServiceError::InsufficientBalance {
                leave_type: draft.leave_type(),
                available,
                requested: draft.total_days(),
            });
        }

        let stored = self.store.insert(draft)?;
        info!(
            leave_id = %stored.id(),
            applicant = %applicant.id,
            leave_type = stored.leave_type().label(),
            total_days = stored.total_days(),
            "leave submitted"
        );
        Ok(stored)
    }

    /// Withdraw a pending application. Only its applicant may do so.
    pub fn cancel(
        &self,
        leave_id: LeaveId,
        requester: &Actor,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let application = self
            .store
            .fetch(leave_id)?
            .ok_or(LeaveServiceError::NotFound(leave_id))?;
        application.ensure_cancellable_by(requester)?;

        let removed = self
            .store
            .remove_pending(leave_id)
            .map_err(|error| match error {
                RepositoryError::StatusConflict { current } => LeaveServiceError::InvalidState {
                    leave_id,
                    status: current,
                },
                RepositoryError::NotFound => LeaveServiceError::NotFound(leave_id),
                other => LeaveServiceError::Repository(other),
            })?;

        info!(%leave_id, applicant = %requester.id, "leave cancelled");
        Ok(removed)
    }

    pub fn review(
        &self,
        leave_id: LeaveId,
        reviewer: &Actor,
        decision: ReviewDecision,
        comment: Option<String>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        self.coordinator
            .review(leave_id, reviewer, decision, comment)
    }

    /// Detail lookup. Applications the viewer may not see are reported as missing.
    pub fn get(
        &self,
        leave_id: LeaveId,
        viewer: &Actor,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        self.store
            .fetch(leave_id)?
            .filter(|application| self.policy.can_view(viewer, application))
            .ok_or(LeaveServiceError::NotFound(leave_id))
    }

    /// The viewer's review queue (or own history for employees), newest first.
    pub fn list_visible(
        &self,
        viewer: &Actor,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        let query = LeaveQuery::new(self.policy.visible_scope(viewer)).with_status(status);
        Ok(self.store.list(&query)?)
    }

    /// The actor's own applications regardless of role, newest first.
    pub fn list_own(
        &self,
        actor: &Actor,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        let query = LeaveQuery::new(VisibilityScope::Applicant {
            user: actor.id.clone(),
        })
        .with_status(status);
        Ok(self.store.list(&query)?)
    }

    pub fn summary(&self, viewer: &Actor) -> Result<StatusSummary, LeaveServiceError> {
        let applications = self.list_visible(viewer, None)?;
        Ok(StatusSummary::tally(&applications))
    }

    /// Read-only: a year with no record reports the opening allowance without creating one.
    pub fn balance(&self, user: &UserId, year: i32) -> Result<LeaveBalance, LeaveServiceError> {
        Ok(self.store.peek(&BalanceKey::new(user.clone(), year))?)
    }

    /// Balance for the current year.
    pub fn current_balance(&self, user: &UserId) -> Result<LeaveBalance, LeaveServiceError> {
        self.balance(user, self.clock.balance_year())
    }

    /// Remove a departing user's leave records. Refused while any application is pending.
    pub fn release_user(&self, user: &UserId) -> Result<PurgeReport, LeaveServiceError> {
        let report = self
            .store
            .purge_applicant(user)
            .map_err(|error| match error {
                RepositoryError::PendingApplications { count } => {
                    LeaveServiceError::PendingApplications {
                        user: user.clone(),
                        count,
                    }
                }
                other => LeaveServiceError::Repository(other),
            })?;
        info!(
            user = %user,
            applications = report.applications,
            balances = report.balances,
            "leave records released"
        );
        Ok(report)
    }
}

/// Dashboard counters over a set of applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusSummary {
    pub fn tally(applications: &[LeaveApplication]) -> Self {
        applications
            .iter()
            .fold(Self::default(), |mut summary, application| {
                summary.total += 1;
                match application.status() {
                    LeaveStatus::Pending => summary.pending += 1,
                    LeaveStatus::Approved => summary.approved += 1,
                    LeaveStatus::Rejected => summary.rejected += 1,
                }
                summary
            })
    }
}

/// Error raised by the leave workflow.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "insufficient {}: available {available} day(s), requested {requested} day(s)",
        .leave_type.display_name()
    )]
    InsufficientBalance {
        leave_type: LeaveType,
        available: u32,
        requested: u32,
    },
    #[error("not permitted: {0}")]
    Authorization(String),
    #[error("{leave_id} has already been {status}")]
    InvalidState {
        leave_id: LeaveId,
        status: LeaveStatus,
    },
    #[error("user {user} still has {count} pending application(s)")]
    PendingApplications { user: UserId, count: usize },
    #[error("{0} not found")]
    NotFound(LeaveId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<TransitionError> for LeaveServiceError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::NotPending { leave_id, status } => {
                LeaveServiceError::InvalidState { leave_id, status }
            }
            TransitionError::NotApplicant { .. } => LeaveServiceError::Authorization(
                "only the applicant can cancel a leave application".to_string(),
            ),
            TransitionError::WrongApplication { .. } => {
                LeaveServiceError::Repository(RepositoryError::Unavailable(error.to_string()))
            }
        }
    }
}
