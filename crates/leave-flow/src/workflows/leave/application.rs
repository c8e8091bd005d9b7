use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::balance::{BalanceDebit, BalanceKey, LeaveAllowance};
use super::calendar::working_days;
use super::domain::{
    Actor, LeaveId, LeaveRequest, LeaveStatus, LeaveType, ReviewDecision, ReviewerRef, Role,
    UserId,
};

/// Request-shape rules plus the allowance new balances open with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePolicy {
    pub allowance: LeaveAllowance,
    /// Longest inclusive calendar span a single application may cover.
    pub max_span_days: u32,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            allowance: LeaveAllowance::default(),
            max_span_days: 30,
        }
    }
}

impl LeavePolicy {
    pub fn validate(&self, request: &LeaveRequest, today: NaiveDate) -> Result<(), ValidationError> {
        if request.start_date < today {
            return Err(ValidationError::StartInPast {
                start: request.start_date,
                today,
            });
        }

        if request.end_date < request.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let span = (request.end_date - request.start_date).num_days() + 1;
        if span > i64::from(self.max_span_days) {
            return Err(ValidationError::SpanTooLong {
                days: span,
                max: self.max_span_days,
            });
        }

        if request.reason.trim().is_empty() {
            return Err(ValidationError::MissingReason);
        }

        Ok(())
    }
}

/// Malformed or out-of-policy request shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("start date {start} cannot be in the past (today is {today})")]
    StartInPast { start: NaiveDate, today: NaiveDate },
    #[error("end date {end} must be on or after start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("a single application cannot exceed {max} days (requested {days})")]
    SpanTooLong { days: i64, max: u32 },
    #[error("a reason for the leave is required")]
    MissingReason,
}

/// Rejected state transition on a single application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{leave_id} has already been {status}")]
    NotPending {
        leave_id: LeaveId,
        status: LeaveStatus,
    },
    #[error("{leave_id} belongs to another applicant")]
    NotApplicant { leave_id: LeaveId },
    #[error("transition targets {expected} but was applied to {found}")]
    WrongApplication { expected: LeaveId, found: LeaveId },
}

/// A validated, sized application that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveApplication {
    applicant: Actor,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: u32,
    reason: String,
    applied_at: DateTime<Utc>,
}

impl NewLeaveApplication {
    /// Size the request in working days. The request must already be validated.
    pub fn sized(applicant: Actor, request: LeaveRequest, applied_at: DateTime<Utc>) -> Self {
        let total_days = working_days(request.start_date, request.end_date);
        Self {
            applicant,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            total_days,
            reason: request.reason.trim().to_string(),
            applied_at,
        }
    }

    pub fn applicant(&self) -> &Actor {
        &self.applicant
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn into_application(self, id: LeaveId) -> LeaveApplication {
        LeaveApplication {
            id,
            applicant: self.applicant,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            total_days: self.total_days,
            reason: self.reason,
            status: LeaveStatus::Pending,
            applied_at: self.applied_at,
            review: None,
        }
    }
}

/// Reviewer, comment, and timestamp recorded together with the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStamp {
    pub reviewer: ReviewerRef,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Everything a store must apply in one atomic commit to finish a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    pub leave_id: LeaveId,
    pub decision: ReviewDecision,
    pub stamp: ReviewStamp,
    pub debit: Option<BalanceDebit>,
}

impl ReviewTransition {
    pub fn outcome(&self) -> LeaveStatus {
        self.decision.outcome()
    }
}

/// Leave request entity. Fields are private so the lifecycle only moves through
/// [`LeaveApplication::begin_review`] and [`LeaveApplication::apply_review`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    id: LeaveId,
    applicant: Actor,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: u32,
    reason: String,
    status: LeaveStatus,
    applied_at: DateTime<Utc>,
    review: Option<ReviewStamp>,
}

impl LeaveApplication {
    pub fn id(&self) -> LeaveId {
        self.id
    }

    pub fn applicant(&self) -> &Actor {
        &self.applicant
    }

    pub fn applicant_id(&self) -> &UserId {
        &self.applicant.id
    }

    pub fn applicant_role(&self) -> Role {
        self.applicant.role
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> LeaveStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    pub fn review(&self) -> Option<&ReviewStamp> {
        self.review.as_ref()
    }

    pub fn reviewed_by(&self) -> Option<&ReviewerRef> {
        self.review.as_ref().map(|stamp| &stamp.reviewer)
    }

    pub fn review_comment(&self) -> Option<&str> {
        self.review
            .as_ref()
            .and_then(|stamp| stamp.comment.as_deref())
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.review.as_ref().map(|stamp| stamp.reviewed_at)
    }

    pub fn ensure_pending(&self) -> Result<(), TransitionError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(TransitionError::NotPending {
                leave_id: self.id,
                status: self.status,
            })
        }
    }

    /// Only the applicant may withdraw, and only while the application is pending.
    pub fn ensure_cancellable_by(&self, requester: &Actor) -> Result<(), TransitionError> {
        if requester.id != self.applicant.id {
            return Err(TransitionError::NotApplicant { leave_id: self.id });
        }
        self.ensure_pending()
    }

    /// Build the pending → approved/rejected transition. Approval carries a debit of
    /// `total_days` against the applicant's balance for `balance_year`.
    ///
    /// Reviewer eligibility is decided by the authorization policy before this is called.
    pub fn begin_review(
        &self,
        reviewer: &Actor,
        decision: ReviewDecision,
        comment: Option<String>,
        reviewed_at: DateTime<Utc>,
        balance_year: i32,
    ) -> Result<ReviewTransition, TransitionError> {
        self.ensure_pending()?;

        let comment = comment
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let debit = match decision {
            ReviewDecision::Approve => Some(BalanceDebit {
                key: BalanceKey::new(self.applicant.id.clone(), balance_year),
                leave_type: self.leave_type,
                days: self.total_days,
            }),
            ReviewDecision::Reject => None,
        };

        Ok(ReviewTransition {
            leave_id: self.id,
            decision,
            stamp: ReviewStamp {
                reviewer: ReviewerRef::from(reviewer),
                comment,
                reviewed_at,
            },
            debit,
        })
    }

    /// Move to the transition's terminal state. Stores call this inside their commit so a
    /// concurrent loser sees [`TransitionError::NotPending`].
    pub fn apply_review(&mut self, transition: &ReviewTransition) -> Result<(), TransitionError> {
        if transition.leave_id != self.id {
            return Err(TransitionError::WrongApplication {
                expected: transition.leave_id,
                found: self.id,
            });
        }
        self.ensure_pending()?;
        self.status = transition.outcome();
        self.review = Some(transition.stamp.clone());
        Ok(())
    }

    pub fn view(&self) -> LeaveView {
        LeaveView {
            leave_id: self.id,
            reference: self.id.to_string(),
            applicant_id: self.applicant.id.clone(),
            applicant_name: self.applicant.display_name().to_string(),
            applicant_role: self.applicant.role.label(),
            department: self.applicant.department.clone(),
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            total_days: self.total_days,
            reason: self.reason.clone(),
            status: self.status.label(),
            applied_at: self.applied_at,
            reviewed_by: self.reviewed_by().map(|reviewer| reviewer.name.clone()),
            reviewer_role: self.reviewed_by().map(|reviewer| reviewer.role.label()),
            review_comment: self.review_comment().map(str::to_string),
            reviewed_at: self.reviewed_at(),
        }
    }
}

/// Flat representation returned by the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveView {
    pub leave_id: LeaveId,
    pub reference: String,
    pub applicant_id: UserId,
    pub applicant_name: String,
    pub applicant_role: &'static str,
    pub department: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub reason: String,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}
