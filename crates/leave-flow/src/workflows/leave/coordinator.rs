use std::sync::Arc;

use tracing::{debug, info, warn};

use super::application::LeaveApplication;
use super::authorization::AuthorizationPolicy;
use super::clock::Clock;
use super::domain::{Actor, LeaveId, ReviewDecision};
use super::repository::{LeaveStore, NotificationSink, RepositoryError, ReviewNotice};
use super::service::LeaveServiceError;

/// Runs a review end to end: eligibility, transition, atomic commit with the balance
/// debit, then a best-effort notification.
pub struct ReviewCoordinator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    policy: AuthorizationPolicy,
    clock: Arc<dyn Clock>,
}

impl<S, N> ReviewCoordinator<S, N>
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            policy: AuthorizationPolicy::new(),
            clock,
        }
    }

    pub fn review(
        &self,
        leave_id: LeaveId,
        reviewer: &Actor,
        decision: ReviewDecision,
        comment: Option<String>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let application = self
            .store
            .fetch(leave_id)?
            .ok_or(LeaveServiceError::NotFound(leave_id))?;

        if let Some(reason) = self.policy.review_denial(reviewer, &application) {
            warn!(%leave_id, reviewer = %reviewer.id, role = reviewer.role.label(), reason, "review refused");
            return Err(LeaveServiceError::Authorization(reason.to_string()));
        }

        let transition = application.begin_review(
            reviewer,
            decision,
            comment,
            self.clock.now(),
            self.clock.balance_year(),
        )?;

        let reviewed = self
            .store
            .commit_review(&transition)
            .map_err(|error| match error {
                RepositoryError::StatusConflict { current } => LeaveServiceError::InvalidState {
                    leave_id,
                    status: current,
                },
                RepositoryError::NotFound => LeaveServiceError::NotFound(leave_id),
                other => LeaveServiceError::Repository(other),
            })?;

        info!(
            %leave_id,
            applicant = %reviewed.applicant_id(),
            reviewer = %reviewer.id,
            status = reviewed.status().label(),
            debited = transition.debit.as_ref().map_or(0, |debit| debit.days),
            "leave reviewed"
        );

        self.dispatch(&reviewed);
        Ok(reviewed)
    }

    fn dispatch(&self, application: &LeaveApplication) {
        let Some(notice) = ReviewNotice::for_application(application) else {
            return;
        };
        match self.notifier.notify(notice) {
            Ok(()) => debug!(leave_id = %application.id(), "review notification queued"),
            Err(error) => {
                warn!(leave_id = %application.id(), %error, "review notification dropped")
            }
        }
    }
}
